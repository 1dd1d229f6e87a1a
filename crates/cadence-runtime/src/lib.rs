//! # cadence-runtime
//!
//! The stateful core of the scheduling widget protocol.
//!
//! - [`SessionStore`]: concurrency-safe session map with idle expiry. Different
//!   sessions never block each other; operations on one session are serialized.
//! - [`ActionRouter`]: the interactive state machine. Validates an action
//!   against the session context, applies the context patch, asks the
//!   [`ToolPlanner`] which widget to show, fetches and populates it.
//! - [`ToolPlanner`]: model-planned or lookup-table widget choice, with the
//!   lookup as mandatory fallback.
//! - [`spawn_sweeper`]: background purge of idle sessions.

#![deny(unsafe_code)]

pub mod errors;
pub mod planner;
pub mod router;
pub mod session;
pub mod store;
pub mod sweeper;
pub mod transition;

pub use errors::RouterError;
pub use planner::{PlanSource, ToolPlanner};
pub use router::ActionRouter;
pub use session::{Session, Turn, TurnOutcome};
pub use store::{SessionNotFound, SessionStore};
pub use sweeper::spawn_sweeper;
pub use transition::{Effect, Transition, transition};
