//! Template and populated widget documents.
//!
//! A template is the empty widget schema handed out by a template source:
//! named slots under `properties`, each with an empty option list. The
//! populator copies it into a [`PopulatedWidget`]; the template itself is
//! shared behind an `Arc` and never written to.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The closed set of widget kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    /// Date + time slot picker with submit/close buttons.
    ScheduleMeeting,
    /// Radio list of supported timezones with confirm/cancel buttons.
    TimezoneSelector,
}

impl WidgetKind {
    /// All kinds, in catalogue order.
    pub const ALL: [Self; 2] = [Self::ScheduleMeeting, Self::TimezoneSelector];

    /// `widget_type` string, also the template file stem.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ScheduleMeeting => "schedule_meeting",
            Self::TimezoneSelector => "timezone_selector",
        }
    }

    /// Name of the tool a planner calls to get this widget.
    pub fn tool_name(self) -> &'static str {
        match self {
            Self::ScheduleMeeting => "get_schedule_meeting_widget",
            Self::TimezoneSelector => "get_timezone_selector_widget",
        }
    }

    /// Inverse of [`tool_name`](Self::tool_name).
    pub fn from_tool_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tool_name() == name)
    }

    /// Inverse of [`as_str`](Self::as_str).
    pub fn parse(widget_type: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == widget_type)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title and description shown in the widget header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMetadata {
    /// Header title.
    #[serde(default)]
    pub title: String,
    /// One-line description.
    #[serde(default)]
    pub description: String,
}

/// An unpopulated widget schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Widget kind.
    pub widget_type: WidgetKind,
    /// Schema version string.
    #[serde(default)]
    pub schema_version: String,
    /// Header metadata.
    #[serde(default)]
    pub metadata: TemplateMetadata,
    /// Named slots to fill.
    pub properties: Map<String, Value>,
    /// Presentation hints, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styling: Option<Value>,
}

impl Template {
    /// Parse a template from JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Catalogue entry for this template under the given file stem.
    pub fn summary(&self, name: impl Into<String>) -> TemplateSummary {
        TemplateSummary {
            name: name.into(),
            widget_type: self.widget_type.as_str().to_string(),
            version: self.schema_version.clone(),
            title: self.metadata.title.clone(),
        }
    }
}

/// Catalogue entry returned by [`TemplateSource::list`](crate::TemplateSource::list).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    /// File stem / lookup name.
    pub name: String,
    /// Declared `widget_type`.
    pub widget_type: String,
    /// Declared `schema_version`.
    pub version: String,
    /// Metadata title.
    pub title: String,
}

/// One entry in a slot's option list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetOption {
    /// Primary display text.
    pub label: String,
    /// Secondary display text (date options).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sublabel: Option<String>,
    /// Canonical value sent back by the client.
    pub value: String,
    /// UTC offset (timezone options).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    /// Whether this option matches the session's selection.
    pub selected: bool,
}

/// A template with option lists and flags filled from session context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulatedWidget {
    /// Widget kind.
    pub widget_type: WidgetKind,
    /// Schema version copied from the template.
    pub schema_version: String,
    /// Header metadata copied from the template.
    pub metadata: TemplateMetadata,
    /// Filled slots.
    pub properties: Map<String, Value>,
    /// Presentation hints copied from the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styling: Option<Value>,
}

impl PopulatedWidget {
    /// JSON document sent to the client.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Options of a slot, or empty when the slot has none.
    pub fn options(&self, slot: &str) -> Vec<WidgetOption> {
        self.properties
            .get(slot)
            .and_then(|s| s.get("options"))
            .and_then(|o| serde_json::from_value(o.clone()).ok())
            .unwrap_or_default()
    }

    /// Values of the selected options in a slot.
    pub fn selected_values(&self, slot: &str) -> Vec<String> {
        self.options(slot)
            .into_iter()
            .filter(|o| o.selected)
            .map(|o| o.value)
            .collect()
    }

    /// `enabled` flag of the button bound to `action`.
    pub fn button_enabled(&self, action: &str) -> Option<bool> {
        self.properties
            .get("actions")?
            .get("buttons")?
            .as_array()?
            .iter()
            .find(|b| b.get("action").and_then(Value::as_str) == Some(action))?
            .get("enabled")?
            .as_bool()
    }
}
