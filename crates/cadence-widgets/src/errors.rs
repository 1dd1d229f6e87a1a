//! Error types for template fetching and population.

use thiserror::Error;

use crate::template::WidgetKind;

/// Errors from a [`TemplateSource`](crate::TemplateSource).
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template exists for the requested widget type.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Reading a template file failed.
    #[error("failed to read template: {0}")]
    Io(#[from] std::io::Error),

    /// A template document is not valid JSON or does not match the schema.
    #[error("invalid template JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The file for one kind declares a different `widget_type`.
    #[error("template kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        /// Kind that was requested.
        expected: WidgetKind,
        /// `widget_type` declared in the document.
        found: String,
    },
}

/// Errors from [`WidgetPopulator::populate`](crate::WidgetPopulator::populate).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PopulateError {
    /// The template lacks a slot the populator must fill.
    #[error("{kind} template has no `{slot}` slot")]
    MissingSlot {
        /// Template kind being populated.
        kind: WidgetKind,
        /// Slot path that was missing.
        slot: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_mismatch_display() {
        let err = TemplateError::KindMismatch {
            expected: WidgetKind::ScheduleMeeting,
            found: "timezone_selector".into(),
        };
        assert_eq!(
            err.to_string(),
            "template kind mismatch: expected schedule_meeting, found timezone_selector"
        );
    }

    #[test]
    fn missing_slot_display() {
        let err = PopulateError::MissingSlot {
            kind: WidgetKind::TimezoneSelector,
            slot: "timezone_list",
        };
        assert_eq!(err.to_string(), "timezone_selector template has no `timezone_list` slot");
    }
}
