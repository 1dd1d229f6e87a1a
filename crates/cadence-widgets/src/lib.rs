//! # cadence-widgets
//!
//! Widget templates and how they become concrete UI data.
//!
//! - [`TemplateSource`]: fetches an empty, typed [`Template`] for a
//!   [`WidgetKind`]. [`BuiltinTemplates`] serves the schemas compiled into the
//!   binary, [`DirectoryTemplates`] reads `<widget_type>.json` files from disk.
//! - [`WidgetPopulator`]: pure `(template, context, today) -> PopulatedWidget`.
//!   Never mutates the template.

#![deny(unsafe_code)]

pub mod errors;
pub mod populator;
pub mod source;
pub mod template;

pub use errors::{PopulateError, TemplateError};
pub use populator::{WidgetPopulator, business_days, time_slot_label, TIME_SLOTS};
pub use source::{BuiltinTemplates, DirectoryTemplates, TemplateSource};
pub use template::{PopulatedWidget, Template, TemplateMetadata, TemplateSummary, WidgetKind, WidgetOption};
