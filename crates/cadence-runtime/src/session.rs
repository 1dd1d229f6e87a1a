//! Session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use cadence_core::{SchedulingContext, SessionId};
use cadence_widgets::WidgetKind;

use crate::planner::PlanSource;

/// What came of one handled action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// A widget was rendered.
    Rendered {
        /// Widget kind sent to the client.
        widget: WidgetKind,
        /// Who chose the widget.
        planned_by: PlanSource,
    },
    /// A meeting was booked.
    Scheduled,
    /// The widget was closed.
    Closed,
    /// The action was answered with an error.
    Rejected {
        /// Server-side reason.
        reason: String,
    },
}

/// One entry in a session's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// When the action was handled.
    pub at: DateTime<Utc>,
    /// Wire name of the action.
    pub action: String,
    /// Result of handling it.
    pub outcome: TurnOutcome,
}

impl Turn {
    /// A turn stamped now.
    pub fn now(action: &str, outcome: TurnOutcome) -> Self {
        Self {
            at: Utc::now(),
            action: action.to_string(),
            outcome,
        }
    }
}

/// Server-side state of one client connection.
#[derive(Clone, Debug)]
pub struct Session {
    /// Opaque identifier, fixed at creation.
    pub id: SessionId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last read or write.
    pub last_activity_at: DateTime<Utc>,
    /// Interactive selection state.
    pub context: SchedulingContext,
    /// Handled actions, oldest first. Only ever appended to.
    pub history: Vec<Turn>,
    pub(crate) last_seen: Instant,
}

impl Session {
    pub(crate) fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            last_activity_at: now,
            context: SchedulingContext::default(),
            history: Vec::new(),
            last_seen: Instant::now(),
        }
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity_at = Utc::now();
        self.last_seen = Instant::now();
    }

    pub(crate) fn is_idle_for(&self, timeout: std::time::Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_seen) > timeout
    }

    /// Append a turn to the history.
    pub fn record(&mut self, turn: Turn) {
        self.history.push(turn);
    }
}
