//! JSON wire protocol between the widget client and the server.
//!
//! Inbound frames are single JSON objects tagged by `"action"`. Decoding is
//! two-step so an unrecognised action name (answered with an error) can be
//! told apart from an undecodable frame (logged and dropped).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::Action;
use crate::context::Selection;
use crate::ids::SessionId;

/// Action names accepted from clients.
pub const INBOUND_ACTIONS: &[&str] = &[
    "select_date",
    "select_time",
    "change_timezone",
    "confirm_timezone",
    "cancel_timezone",
    "submit_schedule",
    "close_widget",
];

/// Errors decoding an inbound frame.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Not JSON, not an object, missing `action`, or missing action fields.
    #[error("malformed message: {0}")]
    Malformed(String),
    /// Well-formed message naming an action the server does not know.
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum InboundMessage {
    SelectDate {
        date: String,
        #[serde(default)]
        label: String,
    },
    SelectTime {
        time: String,
        #[serde(default)]
        label: String,
    },
    ChangeTimezone,
    ConfirmTimezone {
        timezone: String,
    },
    CancelTimezone,
    SubmitSchedule,
    CloseWidget,
}

impl From<InboundMessage> for Action {
    fn from(msg: InboundMessage) -> Self {
        match msg {
            InboundMessage::SelectDate { date, label } => Self::SelectDate(Selection::new(date, label)),
            InboundMessage::SelectTime { time, label } => Self::SelectTime(Selection::new(time, label)),
            InboundMessage::ChangeTimezone => Self::ChangeTimezone,
            InboundMessage::ConfirmTimezone { timezone } => Self::ConfirmTimezone { abbr: timezone },
            InboundMessage::CancelTimezone => Self::CancelTimezone,
            InboundMessage::SubmitSchedule => Self::Submit,
            InboundMessage::CloseWidget => Self::Close,
        }
    }
}

/// Decode one inbound text frame into an [`Action`].
pub fn decode_action(text: &str) -> Result<Action, DecodeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::Malformed(format!("invalid JSON: {e}")))?;

    let name = value
        .as_object()
        .ok_or_else(|| DecodeError::Malformed("expected a JSON object".into()))?
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::Malformed("missing \"action\" string".into()))?;

    if !INBOUND_ACTIONS.contains(&name) {
        return Err(DecodeError::UnknownAction(name.to_owned()));
    }

    let msg: InboundMessage =
        serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    match &msg {
        InboundMessage::SelectDate { date: key, .. } | InboundMessage::SelectTime { time: key, .. }
            if key.trim().is_empty() =>
        {
            Err(DecodeError::Malformed("selection value must not be empty".into()))
        }
        _ => Ok(msg.into()),
    }
}

/// Booking details sent back on a successful submit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    /// Date display label.
    pub date: String,
    /// Time display label in the current timezone.
    pub time: String,
    /// Timezone display label.
    pub timezone: String,
}

/// Outbound message envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A populated widget to render.
    WidgetRender {
        /// Session the widget belongs to.
        session_id: SessionId,
        /// Populated widget document.
        widget: Value,
    },
    /// The meeting was booked.
    MeetingScheduled {
        /// Session that booked.
        session_id: SessionId,
        /// Booking details.
        meeting: Meeting,
        /// Human-readable confirmation.
        message: String,
    },
    /// Informational text.
    Message {
        /// Session the message belongs to.
        session_id: SessionId,
        /// Text to show.
        message: String,
    },
    /// An action could not be handled.
    Error {
        /// Session the failed action targeted.
        session_id: SessionId,
        /// Client-safe error description.
        message: String,
    },
    /// The widget was closed.
    Closed {
        /// Acknowledgment text.
        message: String,
    },
}

impl ServerMessage {
    /// Wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WidgetRender { .. } => "widget_render",
            Self::MeetingScheduled { .. } => "meeting_scheduled",
            Self::Message { .. } => "message",
            Self::Error { .. } => "error",
            Self::Closed { .. } => "closed",
        }
    }

    /// Serialize to a JSON string, logging (and returning empty) on failure.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, kind = self.kind(), "failed to serialize server message");
            String::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn decode_select_date() {
        let action =
            decode_action(r#"{"action":"select_date","date":"2025-01-14","label":"TUE JAN 14"}"#)
                .unwrap();
        assert_eq!(action, Action::SelectDate(Selection::new("2025-01-14", "TUE JAN 14")));
    }

    #[test]
    fn decode_select_time_without_label_uses_value() {
        let action = decode_action(r#"{"action":"select_time","time":"13:45"}"#).unwrap();
        assert_eq!(action, Action::SelectTime(Selection::new("13:45", "13:45")));
    }

    #[test]
    fn decode_unit_actions() {
        assert_eq!(decode_action(r#"{"action":"change_timezone"}"#).unwrap(), Action::ChangeTimezone);
        assert_eq!(decode_action(r#"{"action":"cancel_timezone"}"#).unwrap(), Action::CancelTimezone);
        assert_eq!(decode_action(r#"{"action":"submit_schedule"}"#).unwrap(), Action::Submit);
        assert_eq!(decode_action(r#"{"action":"close_widget"}"#).unwrap(), Action::Close);
    }

    #[test]
    fn decode_confirm_timezone() {
        let action = decode_action(r#"{"action":"confirm_timezone","timezone":"PT"}"#).unwrap();
        assert_eq!(action, Action::ConfirmTimezone { abbr: "PT".into() });
    }

    #[test]
    fn decode_ignores_extra_fields() {
        let action = decode_action(r#"{"action":"change_timezone","extra":1}"#).unwrap();
        assert_eq!(action, Action::ChangeTimezone);
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert_matches!(decode_action("not json"), Err(DecodeError::Malformed(_)));
        assert_matches!(decode_action(""), Err(DecodeError::Malformed(_)));
    }

    #[test]
    fn non_object_is_malformed() {
        assert_matches!(decode_action("[1,2,3]"), Err(DecodeError::Malformed(_)));
    }

    #[test]
    fn missing_action_is_malformed() {
        assert_matches!(decode_action(r#"{"date":"2025-01-14"}"#), Err(DecodeError::Malformed(_)));
        assert_matches!(decode_action(r#"{"action":42}"#), Err(DecodeError::Malformed(_)));
    }

    #[test]
    fn missing_required_field_is_malformed() {
        assert_matches!(decode_action(r#"{"action":"select_date"}"#), Err(DecodeError::Malformed(_)));
        assert_matches!(
            decode_action(r#"{"action":"confirm_timezone"}"#),
            Err(DecodeError::Malformed(_))
        );
    }

    #[test]
    fn blank_selection_value_is_malformed() {
        for frame in [
            r#"{"action":"select_date","date":""}"#,
            r#"{"action":"select_date","date":"  ","label":"TUE JAN 14"}"#,
            r#"{"action":"select_time","time":""}"#,
            r#"{"action":"select_time","time":" ","label":"1:45 PM ET"}"#,
        ] {
            assert_matches!(decode_action(frame), Err(DecodeError::Malformed(_)), "{frame}");
        }
    }

    #[test]
    fn unknown_action_is_distinguished() {
        assert_eq!(
            decode_action(r#"{"action":"book_flight"}"#),
            Err(DecodeError::UnknownAction("book_flight".into()))
        );
    }

    #[test]
    fn connect_is_not_accepted_from_clients() {
        assert_matches!(decode_action(r#"{"action":"connect"}"#), Err(DecodeError::UnknownAction(_)));
    }

    #[test]
    fn widget_render_envelope() {
        let msg = ServerMessage::WidgetRender {
            session_id: SessionId::from("s1"),
            widget: json!({"widget_type": "schedule_meeting"}),
        };
        let value: Value = serde_json::from_str(&msg.to_json()).unwrap();
        assert_eq!(value["type"], "widget_render");
        assert_eq!(value["session_id"], "s1");
        assert_eq!(value["widget"]["widget_type"], "schedule_meeting");
    }

    #[test]
    fn meeting_scheduled_envelope() {
        let msg = ServerMessage::MeetingScheduled {
            session_id: SessionId::from("s1"),
            meeting: Meeting {
                date: "TUE JAN 14".into(),
                time: "1:45 PM ET".into(),
                timezone: "Eastern Time (ET)".into(),
            },
            message: "Meeting scheduled".into(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "meeting_scheduled");
        assert_eq!(value["meeting"]["time"], "1:45 PM ET");
        assert_eq!(msg.kind(), "meeting_scheduled");
    }

    #[test]
    fn closed_has_no_session_id() {
        let value = serde_json::to_value(ServerMessage::Closed { message: "Widget closed".into() }).unwrap();
        assert_eq!(value, json!({"type": "closed", "message": "Widget closed"}));
    }

    #[test]
    fn error_and_message_envelopes() {
        let err = serde_json::to_value(ServerMessage::Error {
            session_id: SessionId::from("s2"),
            message: "nope".into(),
        })
        .unwrap();
        assert_eq!(err["type"], "error");
        assert_eq!(err["message"], "nope");

        let info = serde_json::to_value(ServerMessage::Message {
            session_id: SessionId::from("s2"),
            message: "hi".into(),
        })
        .unwrap();
        assert_eq!(info["type"], "message");
    }
}
