//! # cadence-llm
//!
//! The language-model collaborator that decides which widget to show.
//!
//! The runtime only sees [`DecisionModel`]: given an action and the session
//! context it returns a [`WidgetKind`](cadence_widgets::WidgetKind) or a
//! [`DecisionError`]. [`GeminiDecisionModel`] implements it with a single
//! forced function call against the Gemini `generateContent` API. Free-form
//! text is never parsed; a response without exactly one recognised function
//! call is an error.

#![deny(unsafe_code)]

pub mod errors;
pub mod gemini;
pub mod model;
pub mod prompt;

pub use errors::DecisionError;
pub use gemini::{GeminiConfig, GeminiDecisionModel};
pub use model::DecisionModel;
