//! # cadence-server
//!
//! Axum HTTP + `WebSocket` front end for the scheduling widget.
//!
//! - `GET /ws`: one scheduling session per connection, driven by the
//!   [`ActionRouter`](cadence_runtime::ActionRouter)
//! - `GET /health`: liveness and counters
//! - `GET /metrics`: Prometheus text
//! - `GET /widgets`: template catalogue
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod websocket;
