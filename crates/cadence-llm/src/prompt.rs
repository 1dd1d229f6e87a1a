//! Prompt text for widget decisions.

use cadence_core::{Action, SchedulingContext};
use cadence_widgets::WidgetKind;

/// System instruction describing the widget workflow.
pub const SYSTEM_INSTRUCTION: &str = "\
You drive a meeting scheduling widget. Every user action arrives with the \
current session state as JSON. Answer by calling exactly one tool; the tool \
returns an empty widget schema that the system fills with dates, time slots \
and the user's selections.

Workflow:
- A new connection, a date pick, a time pick, a confirmed timezone and a \
cancelled timezone change all show the schedule meeting widget.
- A request to change the timezone shows the timezone selector widget.
- Timezone changes are a follow-up flow: the user's date and time selections \
are kept by the system and shown again once the flow ends.

Never invent widget structures and never answer with text.";

/// Description offered to the model for each tool.
pub fn tool_description(kind: WidgetKind) -> &'static str {
    match kind {
        WidgetKind::ScheduleMeeting => {
            "Returns the schedule meeting widget: date buttons, time slots, \
             the current timezone and schedule/close buttons."
        }
        WidgetKind::TimezoneSelector => {
            "Returns the timezone selector widget: a list of supported \
             timezones with confirm/cancel buttons."
        }
    }
}

/// User turn describing `action` and the session state.
pub fn action_message(action: &Action, ctx: &SchedulingContext) -> String {
    let session = serde_json::to_string_pretty(ctx).unwrap_or_else(|_| "{}".to_string());
    let what = match action {
        Action::Connect => "User connected and wants to schedule a meeting.".to_string(),
        Action::SelectDate(sel) => format!("User selected date: {}.", sel.label),
        Action::SelectTime(sel) => format!("User selected time: {}.", sel.label),
        Action::ChangeTimezone => {
            "User wants to change timezone (follow-up flow). Keep date/time selections.".to_string()
        }
        Action::ConfirmTimezone { abbr } => {
            format!("User confirmed new timezone: {abbr}. Restore previous selections.")
        }
        Action::CancelTimezone => "User cancelled the timezone change.".to_string(),
        Action::Submit => "User submitted the schedule.".to_string(),
        Action::Close => "User closed the widget.".to_string(),
    };
    format!("Action: {}\n{what}\nSession: {session}", action.name())
}
