//! Prometheus recorder and metric names.
//!
//! Counters are recorded with the `metrics` macros throughout the workspace;
//! the names used there are listed here so dashboards have one reference.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the global Prometheus recorder.
///
/// Call once at startup, before anything records. Panics if another
/// recorder is already installed.
pub fn install_recorder() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// WebSocket connections opened (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections (counter, labels: reason).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Open WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Connection lifetime (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Inbound frames dropped as undecodable (counter).
pub const WS_DECODE_DROPS_TOTAL: &str = "ws_decode_drops_total";
/// Replies dropped because a client's outbound queue was full (counter).
pub const WS_REPLIES_DROPPED_TOTAL: &str = "ws_replies_dropped_total";
/// Actions handled by the router (counter, labels: action).
pub const ACTIONS_TOTAL: &str = "actions_total";
/// Actions answered with an error (counter, labels: kind).
pub const ROUTER_ERRORS_TOTAL: &str = "router_errors_total";
/// Decision model failures answered by the lookup table (counter, labels: action).
pub const PLANNER_FALLBACKS_TOTAL: &str = "planner_fallbacks_total";
/// Template fetches served by the fallback source (counter, labels: widget).
pub const TEMPLATE_FALLBACKS_TOTAL: &str = "template_fallbacks_total";
/// Sessions removed by the sweeper (counter).
pub const SESSIONS_SWEPT_TOTAL: &str = "sessions_swept_total";
/// Sessions held by the store (gauge).
pub const SESSIONS_ACTIVE: &str = "sessions_active";
