//! Action router: drives one action through validation, context update,
//! planning, template fetch and population.
//!
//! The session lock is held only while validating and applying the patch.
//! Planning and template fetches are awaited with no lock held, so a slow
//! collaborator stalls only the connection that is waiting on it.

use std::sync::Arc;

use chrono::NaiveDate;
use metrics::counter;
use tracing::{debug, instrument, warn};

use cadence_core::wire::{Meeting, ServerMessage};
use cadence_core::{Action, SchedulingContext, SessionId};
use cadence_widgets::{
    PopulatedWidget, Template, TemplateSource, WidgetKind, WidgetPopulator, time_slot_label,
};

use crate::errors::RouterError;
use crate::planner::{PlanSource, ToolPlanner};
use crate::session::{Turn, TurnOutcome};
use crate::store::SessionStore;
use crate::transition::{Effect, transition};

/// Text of the close acknowledgment.
pub const CLOSED_MESSAGE: &str = "Widget closed";

type Today = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Routes client actions for every session in one store.
pub struct ActionRouter {
    store: Arc<SessionStore>,
    templates: Arc<dyn TemplateSource>,
    fallback_templates: Option<Arc<dyn TemplateSource>>,
    planner: ToolPlanner,
    populator: WidgetPopulator,
    today: Today,
}

impl ActionRouter {
    /// Router over `store`, fetching from `templates` and planning with
    /// `planner`. Date options start at the local current date.
    pub fn new(
        store: Arc<SessionStore>,
        templates: Arc<dyn TemplateSource>,
        planner: ToolPlanner,
    ) -> Self {
        Self {
            store,
            templates,
            fallback_templates: None,
            planner,
            populator: WidgetPopulator::default(),
            today: Arc::new(|| chrono::Local::now().date_naive()),
        }
    }

    /// Template source tried when the primary one fails.
    #[must_use]
    pub fn with_fallback_templates(mut self, fallback: Arc<dyn TemplateSource>) -> Self {
        self.fallback_templates = Some(fallback);
        self
    }

    /// Replace the populator (e.g. to change the number of dates offered).
    #[must_use]
    pub fn with_populator(mut self, populator: WidgetPopulator) -> Self {
        self.populator = populator;
        self
    }

    /// Replace the date source used for date options.
    #[must_use]
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    /// The session store this router mutates.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// The planning strategy in use.
    pub fn planner(&self) -> &ToolPlanner {
        &self.planner
    }

    /// Handle `action` and always produce a reply. Errors become `error`
    /// messages.
    pub async fn dispatch(&self, session_id: &SessionId, action: Action) -> ServerMessage {
        match self.handle(session_id, action).await {
            Ok(msg) => msg,
            Err(e) => self.error_reply(session_id, &e),
        }
    }

    /// Turn a router error into the `error` message for the client.
    pub fn error_reply(&self, session_id: &SessionId, err: &RouterError) -> ServerMessage {
        counter!("router_errors_total", "kind" => err.kind()).increment(1);
        ServerMessage::Error {
            session_id: session_id.clone(),
            message: err.client_message(),
        }
    }

    /// Handle `action` for `session_id`.
    #[instrument(skip_all, fields(session_id = %session_id, action = action.name()))]
    pub async fn handle(
        &self,
        session_id: &SessionId,
        action: Action,
    ) -> Result<ServerMessage, RouterError> {
        counter!("actions_total", "action" => action.name()).increment(1);

        // Validate and apply under the session lock.
        let applied = self.store.with_session(session_id, |session| {
            let is_new = session.history.is_empty();
            match transition(&action, &session.context, is_new) {
                Ok(t) => {
                    session.context.apply(t.patch);
                    Ok((t.effect, session.context.clone()))
                }
                Err(e) => {
                    session.record(Turn::now(
                        action.name(),
                        TurnOutcome::Rejected {
                            reason: e.to_string(),
                        },
                    ));
                    Err(e)
                }
            }
        })?;
        let (effect, ctx) = applied.inspect_err(|e| debug!(error = %e, "action rejected"))?;

        let (reply, outcome) = match effect {
            Effect::Render => match self.render(&action, &ctx).await {
                Ok((widget, planned_by)) => {
                    let outcome = TurnOutcome::Rendered {
                        widget: widget.widget_type,
                        planned_by,
                    };
                    let reply = ServerMessage::WidgetRender {
                        session_id: session_id.clone(),
                        widget: widget.to_value(),
                    };
                    (Ok(reply), outcome)
                }
                Err(e) => {
                    let outcome = TurnOutcome::Rejected {
                        reason: e.to_string(),
                    };
                    (Err(e), outcome)
                }
            },
            Effect::Schedule => {
                let meeting = meeting_for(&ctx);
                let message = format!("Meeting scheduled for {} at {}", meeting.date, meeting.time);
                let reply = ServerMessage::MeetingScheduled {
                    session_id: session_id.clone(),
                    meeting,
                    message,
                };
                (Ok(reply), TurnOutcome::Scheduled)
            }
            Effect::Close => (
                Ok(ServerMessage::Closed {
                    message: CLOSED_MESSAGE.to_string(),
                }),
                TurnOutcome::Closed,
            ),
        };

        // The session may have been deleted while rendering.
        let _ = self
            .store
            .with_session(session_id, |s| s.record(Turn::now(action.name(), outcome)));
        reply
    }

    async fn render(
        &self,
        action: &Action,
        ctx: &SchedulingContext,
    ) -> Result<(PopulatedWidget, PlanSource), RouterError> {
        let (kind, planned_by) = self.planner.plan(action, ctx).await.ok_or_else(|| {
            RouterError::CollaboratorFailure(format!("no widget planned for {}", action.name()))
        })?;
        let template = self.fetch_template(kind).await?;
        let widget = self
            .populator
            .populate(&template, ctx, (self.today)())
            .map_err(|e| RouterError::CollaboratorFailure(e.to_string()))?;
        debug!(widget = %kind, ?planned_by, "widget rendered");
        Ok((widget, planned_by))
    }

    async fn fetch_template(&self, kind: WidgetKind) -> Result<Arc<Template>, RouterError> {
        match self.templates.fetch(kind).await {
            Ok(t) => Ok(t),
            Err(primary) => {
                let Some(fallback) = &self.fallback_templates else {
                    warn!(widget = %kind, error = %primary, "template fetch failed");
                    return Err(RouterError::CollaboratorFailure(primary.to_string()));
                };
                warn!(widget = %kind, error = %primary, "template fetch failed, using fallback source");
                counter!("template_fallbacks_total", "widget" => kind.as_str()).increment(1);
                fallback
                    .fetch(kind)
                    .await
                    .map_err(|e| RouterError::CollaboratorFailure(e.to_string()))
            }
        }
    }
}

/// Booking details for a context with a complete selection.
///
/// The time label is rebuilt for the current timezone; a value outside the
/// slot table keeps the label the client sent.
fn meeting_for(ctx: &SchedulingContext) -> Meeting {
    let date = ctx
        .selected_date
        .as_ref()
        .map(|s| s.label.clone())
        .unwrap_or_default();
    let time = ctx
        .selected_time
        .as_ref()
        .map(|s| time_slot_label(&s.value, ctx.timezone).unwrap_or_else(|| s.label.clone()))
        .unwrap_or_default();
    Meeting {
        date,
        time,
        timezone: ctx.timezone_label().to_string(),
    }
}
