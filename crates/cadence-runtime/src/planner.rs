//! Widget planning strategies.
//!
//! The planner answers one question: which widget should this action show?
//! [`ToolPlanner::Lookup`] uses the fixed table, [`ToolPlanner::Model`] asks a
//! [`DecisionModel`] and falls back to the same table on any model error or
//! on an answer that contradicts the table, so both variants always produce
//! the widget the session flow expects.

use std::fmt;
use std::sync::Arc;

use cadence_core::{Action, SchedulingContext};
use cadence_llm::DecisionModel;
use cadence_widgets::WidgetKind;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Who picked the widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    /// The language model.
    Model,
    /// The lookup table.
    Lookup,
}

/// Fixed action → widget table. `None` for actions that render nothing.
pub fn lookup(action: &Action) -> Option<WidgetKind> {
    if !action.renders_widget() {
        return None;
    }
    Some(match action {
        Action::ChangeTimezone => WidgetKind::TimezoneSelector,
        _ => WidgetKind::ScheduleMeeting,
    })
}

/// Widget planning strategy, chosen once at startup.
#[derive(Clone)]
pub enum ToolPlanner {
    /// Lookup table only.
    Lookup,
    /// Language model with lookup fallback.
    Model(Arc<dyn DecisionModel>),
}

impl fmt::Debug for ToolPlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lookup => f.write_str("ToolPlanner::Lookup"),
            Self::Model(m) => write!(f, "ToolPlanner::Model({})", m.name()),
        }
    }
}

impl ToolPlanner {
    /// Strategy name for logs and health output.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Lookup => "lookup",
            Self::Model(_) => "model",
        }
    }

    /// Pick the widget for `action`. `None` only for non-rendering actions.
    pub async fn plan(
        &self,
        action: &Action,
        ctx: &SchedulingContext,
    ) -> Option<(WidgetKind, PlanSource)> {
        let fallback = lookup(action)?;
        let Self::Model(model) = self else {
            return Some((fallback, PlanSource::Lookup));
        };

        match model.decide(action, ctx).await {
            Ok(kind) if kind == fallback => Some((kind, PlanSource::Model)),
            Ok(kind) => {
                warn!(action = action.name(), chosen = %kind, expected = %fallback, "model choice contradicts session flow, using lookup table");
                counter!("planner_fallbacks_total", "action" => action.name()).increment(1);
                Some((fallback, PlanSource::Lookup))
            }
            Err(e) => {
                warn!(action = action.name(), model = model.name(), error = %e, fallback = %fallback, "decision model failed, using lookup table");
                counter!("planner_fallbacks_total", "action" => action.name()).increment(1);
                Some((fallback, PlanSource::Lookup))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cadence_core::Selection;
    use cadence_llm::DecisionError;

    struct Fixed(Result<WidgetKind, String>);

    #[async_trait]
    impl DecisionModel for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn decide(
            &self,
            _action: &Action,
            _ctx: &SchedulingContext,
        ) -> Result<WidgetKind, DecisionError> {
            self.0.clone().map_err(DecisionError::NonConforming)
        }
    }

    fn all_actions() -> Vec<Action> {
        vec![
            Action::Connect,
            Action::SelectDate(Selection::new("2025-01-14", "TUE")),
            Action::SelectTime(Selection::new("13:45", "1:45 PM ET")),
            Action::ChangeTimezone,
            Action::ConfirmTimezone { abbr: "PT".into() },
            Action::CancelTimezone,
            Action::Submit,
            Action::Close,
        ]
    }

    #[test]
    fn lookup_table() {
        assert_eq!(lookup(&Action::Connect), Some(WidgetKind::ScheduleMeeting));
        assert_eq!(lookup(&Action::ChangeTimezone), Some(WidgetKind::TimezoneSelector));
        assert_eq!(lookup(&Action::CancelTimezone), Some(WidgetKind::ScheduleMeeting));
        assert_eq!(lookup(&Action::Submit), None);
        assert_eq!(lookup(&Action::Close), None);
    }

    #[tokio::test]
    async fn lookup_planner_matches_table() {
        let ctx = SchedulingContext::default();
        for action in all_actions() {
            let planned = ToolPlanner::Lookup.plan(&action, &ctx).await;
            assert_eq!(planned.map(|(k, _)| k), lookup(&action));
        }
    }

    #[tokio::test]
    async fn failing_model_falls_back_to_table() {
        let planner = ToolPlanner::Model(Arc::new(Fixed(Err("down".into()))));
        let ctx = SchedulingContext::default();
        for action in all_actions() {
            let planned = planner.plan(&action, &ctx).await;
            assert_eq!(planned, lookup(&action).map(|k| (k, PlanSource::Lookup)));
        }
    }

    #[tokio::test]
    async fn model_choice_is_used() {
        let planner = ToolPlanner::Model(Arc::new(Fixed(Ok(WidgetKind::ScheduleMeeting))));
        let planned = planner
            .plan(&Action::Connect, &SchedulingContext::default())
            .await;
        assert_eq!(planned, Some((WidgetKind::ScheduleMeeting, PlanSource::Model)));
    }

    #[tokio::test]
    async fn contradicting_model_choice_uses_table() {
        let planner = ToolPlanner::Model(Arc::new(Fixed(Ok(WidgetKind::ScheduleMeeting))));
        let planned = planner
            .plan(&Action::ChangeTimezone, &SchedulingContext::default())
            .await;
        assert_eq!(planned, Some((WidgetKind::TimezoneSelector, PlanSource::Lookup)));

        let planner = ToolPlanner::Model(Arc::new(Fixed(Ok(WidgetKind::TimezoneSelector))));
        let planned = planner
            .plan(&Action::CancelTimezone, &SchedulingContext::default())
            .await;
        assert_eq!(planned, Some((WidgetKind::ScheduleMeeting, PlanSource::Lookup)));
    }

    #[tokio::test]
    async fn model_not_consulted_for_non_rendering_actions() {
        let planner = ToolPlanner::Model(Arc::new(Fixed(Ok(WidgetKind::TimezoneSelector))));
        assert_eq!(planner.plan(&Action::Submit, &SchedulingContext::default()).await, None);
    }

    #[test]
    fn mode_names() {
        assert_eq!(ToolPlanner::Lookup.mode(), "lookup");
        let planner = ToolPlanner::Model(Arc::new(Fixed(Ok(WidgetKind::ScheduleMeeting))));
        assert_eq!(planner.mode(), "model");
        assert_eq!(format!("{planner:?}"), "ToolPlanner::Model(fixed)");
    }
}
