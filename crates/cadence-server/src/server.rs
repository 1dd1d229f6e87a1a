//! `CadenceServer`: Axum HTTP + `WebSocket` front end.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use cadence_runtime::ActionRouter;
use cadence_widgets::TemplateSource;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::registry::ConnectionRegistry;
use crate::websocket::session::{Heartbeat, SessionDeps, run_ws_session};

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Action router, which owns the session store.
    pub router: Arc<ActionRouter>,
    /// Template catalogue for `/widgets`.
    pub templates: Arc<dyn TemplateSource>,
    /// Open connections.
    pub connections: Arc<ConnectionRegistry>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus handle, if a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
    /// Listener and connection limits.
    pub config: ServerConfig,
}

/// The scheduling widget server.
pub struct CadenceServer {
    state: AppState,
}

impl CadenceServer {
    /// Create a server around a ready router.
    pub fn new(
        config: ServerConfig,
        router: Arc<ActionRouter>,
        templates: Arc<dyn TemplateSource>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            state: AppState {
                router,
                templates,
                connections: Arc::new(ConnectionRegistry::new()),
                shutdown: Arc::new(ShutdownCoordinator::new()),
                start_time: Instant::now(),
                metrics,
                config,
            },
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/ws", get(ws_handler))
            .route("/metrics", get(metrics_handler))
            .route("/widgets", get(widgets_handler))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// Returns the bound address (useful with port `0`) and the serve task.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = TcpListener::bind(self.state.config.bind_addr()).await?;
        let addr = listener.local_addr()?;
        let app = self.router();
        let token = self.state.shutdown.token();

        info!(%addr, planner = self.state.router.planner().mode(), "cadence server listening");
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!(error = %e, "server error");
            }
        });
        Ok((addr, handle))
    }

    /// Open connections.
    pub fn connections(&self) -> &Arc<ConnectionRegistry> {
        &self.state.connections
    }

    /// Shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.connections.count().await;
    Json(health::health_check(
        state.start_time,
        connections,
        state.router.store().len(),
        state.router.planner().mode(),
    ))
}

/// GET /ws
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    if state.shutdown.is_shutting_down() {
        return (StatusCode::SERVICE_UNAVAILABLE, "shutting down").into_response();
    }
    let deps = SessionDeps {
        router: Arc::clone(&state.router),
        connections: Arc::clone(&state.connections),
        heartbeat: Heartbeat {
            interval: state.config.heartbeat_interval(),
            timeout: state.config.heartbeat_timeout(),
        },
        shutdown: state.shutdown.token(),
    };
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| run_ws_session(socket, deps))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// GET /widgets
async fn widgets_handler(State(state): State<AppState>) -> Response {
    match state.templates.list().await {
        Ok(list) => Json(list).into_response(),
        Err(e) => {
            warn!(error = %e, "template listing failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "template listing failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use cadence_runtime::{SessionStore, ToolPlanner};
    use cadence_widgets::{BuiltinTemplates, DirectoryTemplates};
    use tower::ServiceExt;

    fn test_config() -> ServerConfig {
        ServerConfig {
            port: 0,
            ..ServerConfig::default()
        }
    }

    fn make_server_with(templates: Arc<dyn TemplateSource>) -> CadenceServer {
        let store = Arc::new(SessionStore::new(Duration::from_secs(60)));
        let router = Arc::new(ActionRouter::new(
            store,
            Arc::new(BuiltinTemplates::new().unwrap()),
            ToolPlanner::Lookup,
        ));
        CadenceServer::new(test_config(), router, templates, None)
    }

    fn make_server() -> CadenceServer {
        make_server_with(Arc::new(BuiltinTemplates::new().unwrap()))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let server = make_server();
        let _ = server.state.router.store().create();
        let (status, body) = get_json(server.router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connections"], 0);
        assert_eq!(body["active_sessions"], 1);
        assert_eq!(body["planner"], "lookup");
    }

    #[tokio::test]
    async fn widgets_lists_templates() {
        let (status, body) = get_json(make_server().router(), "/widgets").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["widgetType"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["schedule_meeting", "timezone_selector"]);
    }

    #[tokio::test]
    async fn widgets_listing_failure_is_500() {
        let server = make_server_with(Arc::new(DirectoryTemplates::new(
            "/nonexistent/cadence/templates",
        )));
        let (status, _) = get_json(server.router(), "/widgets").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_404() {
        let (status, _) = get_json(make_server().router(), "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_with_recorder_renders() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(60)));
        let templates: Arc<dyn TemplateSource> = Arc::new(BuiltinTemplates::new().unwrap());
        let router = Arc::new(ActionRouter::new(store, Arc::clone(&templates), ToolPlanner::Lookup));
        let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
            .build_recorder()
            .handle();
        let server = CadenceServer::new(test_config(), router, templates, Some(handle));
        let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let resp = server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ws_without_upgrade_is_rejected() {
        let req = Request::builder().uri("/ws").body(Body::empty()).unwrap();
        let resp = make_server().router().oneshot(req).await.unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let req = Request::builder().uri("/nonexistent").body(Body::empty()).unwrap();
        let resp = make_server().router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listen_binds_and_stops_on_shutdown() {
        let server = make_server();
        let (addr, handle) = server.listen().await.unwrap();
        assert_ne!(addr.port(), 0);
        server.shutdown().shutdown();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
