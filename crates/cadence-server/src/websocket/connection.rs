//! State for one connected widget client.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use cadence_core::wire::ServerMessage;
use cadence_core::{ClientId, SessionId};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

/// One open `WebSocket`, bound to exactly one session for its lifetime.
pub struct ClientConnection {
    /// Connection id.
    pub id: ClientId,
    /// Session created for this connection.
    pub session_id: SessionId,
    tx: mpsc::Sender<String>,
    /// When the socket was accepted.
    pub connected_at: Instant,
    is_alive: AtomicBool,
    last_pong: Mutex<Instant>,
    dropped: AtomicU64,
}

impl ClientConnection {
    /// Wrap the outbound channel of a freshly accepted socket.
    pub fn new(id: ClientId, session_id: SessionId, tx: mpsc::Sender<String>) -> Self {
        let now = Instant::now();
        Self {
            id,
            session_id,
            tx,
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped: AtomicU64::new(0),
        }
    }

    /// Queue `message` for the client.
    ///
    /// Returns `false` when the outbound queue is full or the writer is gone.
    pub fn send(&self, message: &ServerMessage) -> bool {
        let json = message.to_json();
        if json.is_empty() {
            warn!(client_id = %self.id, kind = message.kind(), "reply not sent");
            return false;
        }
        if self.tx.try_send(json).is_ok() {
            true
        } else {
            let _ = self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Replies dropped because the queue was full or closed.
    pub fn drop_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Record a pong (or any inbound frame).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Read and clear the alive flag. `true` if the client was heard from
    /// since the previous check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Time since the client was last heard from.
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection(capacity: usize) -> (ClientConnection, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        let conn = ClientConnection::new(ClientId::from("c1"), SessionId::from("s1"), tx);
        (conn, rx)
    }

    #[test]
    fn send_encodes_json() {
        let (conn, mut rx) = make_connection(4);
        assert!(conn.send(&ServerMessage::Closed {
            message: "Widget closed".into()
        }));
        let text = rx.try_recv().unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["type"], "closed");
    }

    #[test]
    fn full_queue_counts_drops() {
        let (conn, _rx) = make_connection(1);
        let msg = ServerMessage::Closed {
            message: "x".into(),
        };
        assert!(conn.send(&msg));
        assert!(!conn.send(&msg));
        assert_eq!(conn.drop_count(), 1);
    }

    #[test]
    fn closed_queue_rejects() {
        let (conn, rx) = make_connection(4);
        drop(rx);
        assert!(!conn.send(&ServerMessage::Closed {
            message: "x".into()
        }));
    }

    #[test]
    fn alive_flag_resets_on_check() {
        let (conn, _rx) = make_connection(1);
        assert!(conn.check_alive());
        assert!(!conn.check_alive());
        conn.mark_alive();
        assert!(conn.check_alive());
        assert!(conn.last_pong_elapsed() < Duration::from_secs(1));
    }
}
