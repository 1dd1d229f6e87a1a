//! Router error types.

use cadence_core::SessionId;

use crate::store::SessionNotFound;

/// Why an action produced an `error` result instead of a widget.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouterError {
    /// The session does not exist or has expired.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The client sent an action name the router does not handle.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The action is not valid in the session's current state.
    #[error("invalid transition for {action}: {reason}")]
    InvalidTransition {
        /// Wire name of the rejected action.
        action: &'static str,
        /// Client-facing reason.
        reason: String,
    },

    /// The model, the template source or the populator failed with no
    /// fallback left.
    #[error("collaborator failure: {0}")]
    CollaboratorFailure(String),
}

impl RouterError {
    /// Text sent to the client in the `error` message.
    ///
    /// Collaborator details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            Self::SessionNotFound(_) => "Session not found or expired".to_string(),
            Self::UnknownAction(name) => format!("Unknown action: {name}"),
            Self::InvalidTransition { reason, .. } => reason.clone(),
            Self::CollaboratorFailure(_) => {
                "Something went wrong while loading the widget. Please try again.".to_string()
            }
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "session_not_found",
            Self::UnknownAction(_) => "unknown_action",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::CollaboratorFailure(_) => "collaborator_failure",
        }
    }
}

impl From<SessionNotFound> for RouterError {
    fn from(e: SessionNotFound) -> Self {
        Self::SessionNotFound(e.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_hide_internals() {
        let err = RouterError::CollaboratorFailure("connection refused to 10.0.0.3".into());
        assert!(!err.client_message().contains("10.0.0.3"));
        assert_eq!(err.kind(), "collaborator_failure");
    }

    #[test]
    fn invalid_transition_uses_reason() {
        let err = RouterError::InvalidTransition {
            action: "submit_schedule",
            reason: "Please select a date and a time first".into(),
        };
        assert_eq!(err.client_message(), "Please select a date and a time first");
        assert_eq!(
            err.to_string(),
            "invalid transition for submit_schedule: Please select a date and a time first"
        );
    }

    #[test]
    fn session_not_found_from_store_error() {
        let id = SessionId::from("s-1");
        let err: RouterError = SessionNotFound(id.clone()).into();
        assert_eq!(err, RouterError::SessionNotFound(id));
        assert_eq!(err.client_message(), "Session not found or expired");
    }
}
