//! Lifecycle of one widget connection, from upgrade to disconnect.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use cadence_core::wire::{DecodeError, ServerMessage, decode_action};
use cadence_core::{Action, ClientId, SessionId};
use cadence_runtime::{ActionRouter, RouterError};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Span, debug, info, instrument, warn};

use super::connection::ClientConnection;
use super::registry::ConnectionRegistry;
use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL,
    WS_DECODE_DROPS_TOTAL, WS_DISCONNECTIONS_TOTAL, WS_REPLIES_DROPPED_TOTAL,
};

/// Outbound queue depth per connection.
const SEND_QUEUE: usize = 64;

/// How long the writer gets to flush after the reader stops.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Ping cadence and the silence after which a client is dropped.
#[derive(Clone, Copy, Debug)]
pub struct Heartbeat {
    /// Time between server pings.
    pub interval: Duration,
    /// Maximum time without any frame from the client.
    pub timeout: Duration,
}

/// Shared pieces a connection needs.
#[derive(Clone)]
pub struct SessionDeps {
    /// Action router (owns the session store).
    pub router: Arc<ActionRouter>,
    /// Open connection registry.
    pub connections: Arc<ConnectionRegistry>,
    /// Ping settings.
    pub heartbeat: Heartbeat,
    /// Server-wide shutdown token.
    pub shutdown: CancellationToken,
}

/// Why a connection ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Disconnect {
    ClientClosed,
    StreamEnded,
    Unresponsive,
    Shutdown,
}

impl Disconnect {
    fn as_str(self) -> &'static str {
        match self {
            Self::ClientClosed => "client_closed",
            Self::StreamEnded => "stream_ended",
            Self::Unresponsive => "unresponsive",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Drive one client connection.
///
/// 1. Creates a session and replies with the initial widget
/// 2. Decodes text frames into actions and replies through the router
/// 3. Pings on an interval and drops clients that stop answering
/// 4. Deletes the session and unregisters the connection on exit
#[instrument(skip_all, fields(client_id, session_id))]
pub async fn run_ws_session(ws: WebSocket, deps: SessionDeps) {
    let client_id = ClientId::new();
    let session_id = deps.router.store().create();
    let span = Span::current();
    let _ = span.record("client_id", client_id.as_str());
    let _ = span.record("session_id", session_id.as_str());

    let (mut ws_tx, mut ws_rx) = ws.split();
    let (send_tx, mut send_rx) = mpsc::channel::<String>(SEND_QUEUE);
    let connection = Arc::new(ClientConnection::new(
        client_id.clone(),
        session_id.clone(),
        send_tx,
    ));
    let cancel = deps.shutdown.child_token();
    let started = Instant::now();

    info!("widget client connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);
    deps.connections.add(Arc::clone(&connection)).await;

    let writer = {
        let conn = Arc::clone(&connection);
        let cancel = cancel.clone();
        let heartbeat = deps.heartbeat;
        tokio::spawn(async move {
            let mut ping = tokio::time::interval(heartbeat.interval);
            let _ = ping.tick().await;

            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                    msg = send_rx.recv() => {
                        let Some(text) = msg else { break };
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            cancel.cancel();
                            break;
                        }
                    }
                    _ = ping.tick() => {
                        if !conn.check_alive() && conn.last_pong_elapsed() > heartbeat.timeout {
                            warn!(timeout = ?heartbeat.timeout, "client unresponsive, disconnecting");
                            cancel.cancel();
                            break;
                        }
                        if ws_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                            cancel.cancel();
                            break;
                        }
                    }
                }
            }
        })
    };

    let opening = deps.router.dispatch(&session_id, Action::Connect).await;
    let _ = connection.send(&opening);

    let reason = loop {
        let frame = tokio::select! {
            () = cancel.cancelled() => {
                break if deps.shutdown.is_cancelled() {
                    Disconnect::Shutdown
                } else {
                    Disconnect::Unresponsive
                };
            }
            frame = ws_rx.next() => frame,
        };

        let text = match frame {
            Some(Ok(Message::Text(t))) => t.to_string(),
            Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                Ok(s) => s,
                Err(_) => {
                    debug!(len = data.len(), "non-UTF8 binary frame dropped");
                    counter!(WS_DECODE_DROPS_TOTAL).increment(1);
                    continue;
                }
            },
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                connection.mark_alive();
                continue;
            }
            Some(Ok(Message::Close(_))) => break Disconnect::ClientClosed,
            Some(Err(e)) => {
                debug!(error = %e, "websocket read error");
                break Disconnect::StreamEnded;
            }
            None => break Disconnect::StreamEnded,
        };
        connection.mark_alive();

        let Some(reply) = handle_frame(&deps.router, &session_id, &text).await else {
            continue;
        };
        if !connection.send(&reply) {
            warn!(kind = reply.kind(), "outbound queue full or closed, reply dropped");
        }
    };

    let dropped = connection.drop_count();
    info!(reason = reason.as_str(), dropped, "widget client disconnected");
    if dropped > 0 {
        counter!(WS_REPLIES_DROPPED_TOTAL).increment(dropped);
    }
    if deps.router.store().delete(&session_id).is_err() {
        debug!("session already gone at disconnect");
    }
    let _ = deps.connections.remove(&client_id).await;
    cancel.cancel();
    let aborter = writer.abort_handle();
    if tokio::time::timeout(DRAIN_TIMEOUT, writer).await.is_err() {
        aborter.abort();
    }

    counter!(WS_DISCONNECTIONS_TOTAL, "reason" => reason.as_str()).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
}

/// Decode one text frame and route it. `None` means the frame was dropped.
pub async fn handle_frame(
    router: &ActionRouter,
    session_id: &SessionId,
    text: &str,
) -> Option<ServerMessage> {
    match decode_action(text) {
        Ok(action) => Some(router.dispatch(session_id, action).await),
        Err(DecodeError::UnknownAction(name)) => {
            Some(router.error_reply(session_id, &RouterError::UnknownAction(name)))
        }
        Err(DecodeError::Malformed(reason)) => {
            warn!(%reason, "malformed frame dropped");
            counter!(WS_DECODE_DROPS_TOTAL).increment(1);
            None
        }
    }
}
