//! Client-initiated actions that drive the scheduling state machine.

use crate::context::Selection;

/// An event that may transition session state and/or re-render a widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// A client connected and its session was just created.
    Connect,
    /// The user picked a date.
    SelectDate(Selection),
    /// The user picked a time slot.
    SelectTime(Selection),
    /// The user opened the timezone selector.
    ChangeTimezone,
    /// The user confirmed a timezone by abbreviation.
    ConfirmTimezone {
        /// Abbreviation as sent by the client (validated by the router).
        abbr: String,
    },
    /// The user dismissed the timezone selector.
    CancelTimezone,
    /// The user asked to book the selected slot.
    Submit,
    /// The user closed the widget.
    Close,
}

impl Action {
    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::SelectDate(_) => "select_date",
            Self::SelectTime(_) => "select_time",
            Self::ChangeTimezone => "change_timezone",
            Self::ConfirmTimezone { .. } => "confirm_timezone",
            Self::CancelTimezone => "cancel_timezone",
            Self::Submit => "submit_schedule",
            Self::Close => "close_widget",
        }
    }

    /// Whether handling this action ends in a rendered widget.
    pub fn renders_widget(&self) -> bool {
        !matches!(self, Self::Submit | Self::Close)
    }
}
