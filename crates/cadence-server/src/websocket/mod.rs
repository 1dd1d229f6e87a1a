//! `WebSocket` transport: per-client connection state, the registry of open
//! connections and the session loop that drives one widget session.

pub mod connection;
pub mod registry;
pub mod session;
