//! The decision collaborator interface.

use async_trait::async_trait;
use cadence_core::{Action, SchedulingContext};
use cadence_widgets::WidgetKind;

use crate::errors::DecisionError;

/// Decides which widget an action should render.
#[async_trait]
pub trait DecisionModel: Send + Sync {
    /// Short identifier for logs (`"gemini-2.0-flash"`).
    fn name(&self) -> &str;

    /// Pick the widget to fetch for `action` given the current context.
    async fn decide(
        &self,
        action: &Action,
        ctx: &SchedulingContext,
    ) -> Result<WidgetKind, DecisionError>;
}
