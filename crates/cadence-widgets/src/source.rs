//! Template sources.
//!
//! A [`TemplateSource`] answers `fetch(kind)` with an empty template and
//! `list()` with the catalogue of everything it can serve.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::TemplateError;
use crate::template::{Template, TemplateSummary, WidgetKind};

const SCHEDULE_MEETING_JSON: &str = include_str!("../templates/schedule_meeting.json");
const TIMEZONE_SELECTOR_JSON: &str = include_str!("../templates/timezone_selector.json");

/// Supplies empty widget templates.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Fetch the template for `kind`.
    async fn fetch(&self, kind: WidgetKind) -> Result<Arc<Template>, TemplateError>;

    /// Summaries of every available template, sorted by name.
    async fn list(&self) -> Result<Vec<TemplateSummary>, TemplateError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Built-in templates
// ─────────────────────────────────────────────────────────────────────────────

/// Templates compiled into the binary.
#[derive(Debug)]
pub struct BuiltinTemplates {
    templates: HashMap<WidgetKind, Arc<Template>>,
}

impl BuiltinTemplates {
    /// Parse the embedded schemas.
    pub fn new() -> Result<Self, TemplateError> {
        let mut templates = HashMap::new();
        for (kind, text) in [
            (WidgetKind::ScheduleMeeting, SCHEDULE_MEETING_JSON),
            (WidgetKind::TimezoneSelector, TIMEZONE_SELECTOR_JSON),
        ] {
            let template = Template::from_json(text)?;
            check_kind(kind, &template)?;
            let _ = templates.insert(kind, Arc::new(template));
        }
        Ok(Self { templates })
    }
}

#[async_trait]
impl TemplateSource for BuiltinTemplates {
    async fn fetch(&self, kind: WidgetKind) -> Result<Arc<Template>, TemplateError> {
        self.templates
            .get(&kind)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound(kind.to_string()))
    }

    async fn list(&self) -> Result<Vec<TemplateSummary>, TemplateError> {
        Ok(WidgetKind::ALL
            .into_iter()
            .filter_map(|kind| self.templates.get(&kind).map(|t| t.summary(kind.as_str())))
            .collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory templates
// ─────────────────────────────────────────────────────────────────────────────

/// Templates read from `<dir>/<widget_type>.json` on every fetch.
///
/// Edits to the files take effect without a restart.
#[derive(Clone, Debug)]
pub struct DirectoryTemplates {
    dir: PathBuf,
}

impl DirectoryTemplates {
    /// Serve templates from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory being served.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl TemplateSource for DirectoryTemplates {
    async fn fetch(&self, kind: WidgetKind) -> Result<Arc<Template>, TemplateError> {
        let path = self.dir.join(format!("{}.json", kind.as_str()));
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TemplateError::NotFound(kind.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let template = Template::from_json(&text)?;
        check_kind(kind, &template)?;
        debug!(path = %path.display(), %kind, "loaded template");
        Ok(Arc::new(template))
    }

    async fn list(&self) -> Result<Vec<TemplateSummary>, TemplateError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut summaries = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            match read_summary(&path, name).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable template"),
            }
        }

        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }
}

/// Summaries are read loosely so a catalogue can list kinds the populator
/// does not know.
async fn read_summary(path: &Path, name: String) -> Result<TemplateSummary, TemplateError> {
    let text = tokio::fs::read_to_string(path).await?;
    let doc: Value = serde_json::from_str(&text)?;
    let field = |v: Option<&Value>| v.and_then(Value::as_str).unwrap_or_default().to_string();
    Ok(TemplateSummary {
        name,
        widget_type: field(doc.get("widget_type")),
        version: field(doc.get("schema_version")),
        title: field(doc.get("metadata").and_then(|m| m.get("title"))),
    })
}

fn check_kind(expected: WidgetKind, template: &Template) -> Result<(), TemplateError> {
    if template.widget_type == expected {
        Ok(())
    } else {
        Err(TemplateError::KindMismatch {
            expected,
            found: template.widget_type.to_string(),
        })
    }
}
