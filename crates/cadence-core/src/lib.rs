//! # cadence-core
//!
//! Foundation types shared by every Cadence crate.
//!
//! - **Branded IDs**: `SessionId`, `ClientId` as newtypes for type safety
//! - **Scheduling context**: the per-session selection state and its merge patch
//! - **Actions**: the closed set of client-initiated events
//! - **Wire**: inbound message decoding and outbound `ServerMessage` envelopes
//! - **Timezones**: the fixed set of supported display timezones
//! - **Logging**: `tracing` subscriber initialization

#![deny(unsafe_code)]

pub mod action;
pub mod context;
pub mod ids;
pub mod logging;
pub mod timezone;
pub mod wire;

pub use action::Action;
pub use context::{ContextPatch, PendingFlow, SchedulingContext, Selection};
pub use ids::{ClientId, SessionId};
pub use timezone::Timezone;
