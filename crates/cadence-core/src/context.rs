//! Per-session scheduling context and the shallow-merge patch applied to it.
//!
//! The context is the only mutable part of a session. Date and time
//! selections are stored as a [`Selection`] (canonical value + display label)
//! so a label can never exist without its value or vice versa.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::timezone::Timezone;

/// A selected option: canonical value plus the label the client displayed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Canonical key (`"2025-01-14"`, `"13:45"`).
    pub value: String,
    /// Display string (`"TUE JAN 14"`, `"1:45 PM ET"`).
    pub label: String,
}

impl Selection {
    /// Build a selection. An empty label falls back to the value.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        let value = value.into();
        let label = label.into();
        let label = if label.is_empty() { value.clone() } else { label };
        Self { value, label }
    }
}

/// Follow-up sub-flow the session is currently in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingFlow {
    /// The timezone selector is open on top of the scheduling widget.
    SelectingTimezone,
}

/// Interactive state of one scheduling session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingContext {
    /// Display timezone for time slot labels.
    pub timezone: Timezone,
    /// Selected date, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_date: Option<Selection>,
    /// Selected time of day, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_time: Option<Selection>,
    /// Active follow-up flow, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_flow: Option<PendingFlow>,
    /// Additional named fields merged in by callers.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SchedulingContext {
    /// Display label of the current timezone.
    pub fn timezone_label(&self) -> &'static str {
        self.timezone.label()
    }

    /// Abbreviation of the current timezone.
    pub fn timezone_abbr(&self) -> &'static str {
        self.timezone.abbr()
    }

    /// Canonical value of the selected date.
    pub fn selected_date_value(&self) -> Option<&str> {
        self.selected_date.as_ref().map(|s| s.value.as_str())
    }

    /// Canonical value of the selected time.
    pub fn selected_time_value(&self) -> Option<&str> {
        self.selected_time.as_ref().map(|s| s.value.as_str())
    }

    /// Both a date and a time have been chosen.
    pub fn has_complete_selection(&self) -> bool {
        self.selected_date.is_some() && self.selected_time.is_some()
    }

    /// Whether the timezone selector sub-flow is open.
    pub fn is_selecting_timezone(&self) -> bool {
        self.pending_flow == Some(PendingFlow::SelectingTimezone)
    }

    /// Shallow-merge a patch: fields present in the patch overwrite, absent
    /// fields are left alone, unknown `extra` keys are added.
    pub fn apply(&mut self, patch: ContextPatch) {
        if let Some(tz) = patch.timezone {
            self.timezone = tz;
        }
        if let Some(date) = patch.selected_date {
            self.selected_date = Some(date);
        }
        if let Some(time) = patch.selected_time {
            self.selected_time = Some(time);
        }
        if let Some(flow) = patch.pending_flow {
            self.pending_flow = flow;
        }
        for (key, value) in patch.extra {
            let _ = self.extra.insert(key, value);
        }
    }
}

/// Partial update to a [`SchedulingContext`].
///
/// `None` means "leave unchanged". `pending_flow` is doubly optional so a
/// patch can clear the flow (`Some(None)`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContextPatch {
    /// New timezone.
    pub timezone: Option<Timezone>,
    /// New date selection.
    pub selected_date: Option<Selection>,
    /// New time selection.
    pub selected_time: Option<Selection>,
    /// New flow state (`Some(None)` clears it).
    pub pending_flow: Option<Option<PendingFlow>>,
    /// Extra named fields to add or overwrite.
    pub extra: Map<String, Value>,
}

impl ContextPatch {
    /// Set the date selection.
    #[must_use]
    pub fn date(mut self, selection: Selection) -> Self {
        self.selected_date = Some(selection);
        self
    }

    /// Set the time selection.
    #[must_use]
    pub fn time(mut self, selection: Selection) -> Self {
        self.selected_time = Some(selection);
        self
    }

    /// Set the timezone.
    #[must_use]
    pub fn timezone(mut self, tz: Timezone) -> Self {
        self.timezone = Some(tz);
        self
    }

    /// Enter a follow-up flow.
    #[must_use]
    pub fn enter_flow(mut self, flow: PendingFlow) -> Self {
        self.pending_flow = Some(Some(flow));
        self
    }

    /// Leave any follow-up flow.
    #[must_use]
    pub fn clear_flow(mut self) -> Self {
        self.pending_flow = Some(None);
        self
    }

    /// Add or overwrite an extra field.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        let _ = self.extra.insert(key.into(), value);
        self
    }
}
