//! In-memory session store with idle expiry.
//!
//! Sessions live in a `DashMap` keyed by id, each behind its own mutex. A
//! lookup clones the `Arc` out of the map and releases the shard before
//! locking the session, so work on one session never holds a map shard and
//! sessions on the same shard do not wait on each other. Lock order is
//! always shard then session.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use cadence_core::{ContextPatch, SessionId};

use crate::session::Session;

/// The session does not exist or has expired.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("session not found: {0}")]
pub struct SessionNotFound(pub SessionId);

/// Process-wide session map.
pub struct SessionStore {
    sessions: DashMap<SessionId, Arc<Mutex<Session>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    /// Store expiring sessions idle for longer than `idle_timeout`.
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout,
        }
    }

    /// Configured idle timeout.
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Allocate a session with a default context.
    pub fn create(&self) -> SessionId {
        let id = SessionId::new();
        let _ = self
            .sessions
            .insert(id.clone(), Arc::new(Mutex::new(Session::new(id.clone()))));
        debug!(session_id = %id, "session created");
        id
    }

    /// Snapshot of a session. Refreshes its activity time.
    pub fn get(&self, id: &SessionId) -> Result<Session, SessionNotFound> {
        self.with_session(id, |session| session.clone())
    }

    /// Shallow-merge `patch` into the session context.
    pub fn update(&self, id: &SessionId, patch: ContextPatch) -> Result<(), SessionNotFound> {
        self.with_session(id, |session| session.context.apply(patch))
    }

    /// Run `f` with exclusive access to the session.
    ///
    /// Nothing else touches the session while `f` runs, so a
    /// read-validate-write inside `f` is atomic. `f` must not block or await.
    pub fn with_session<R>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<R, SessionNotFound> {
        let entry = self
            .sessions
            .get(id)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| SessionNotFound(id.clone()))?;

        let mut session = entry.lock();
        if session.is_idle_for(self.idle_timeout, Instant::now()) {
            drop(session);
            self.remove_if_expired(id);
            return Err(SessionNotFound(id.clone()));
        }
        session.touch();
        Ok(f(&mut session))
    }

    /// Remove a session.
    pub fn delete(&self, id: &SessionId) -> Result<(), SessionNotFound> {
        self.sessions
            .remove(id)
            .map(|_| debug!(session_id = %id, "session deleted"))
            .ok_or_else(|| SessionNotFound(id.clone()))
    }

    /// Remove every session idle for longer than the timeout. Returns how
    /// many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.sessions.retain(|_, session| {
            let expired = session.lock().is_idle_for(self.idle_timeout, now);
            removed += usize::from(expired);
            !expired
        });
        removed
    }

    /// Number of sessions held, expired or not.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn remove_if_expired(&self, id: &SessionId) {
        let now = Instant::now();
        let removed = self
            .sessions
            .remove_if(id, |_, session| session.lock().is_idle_for(self.idle_timeout, now));
        if removed.is_some() {
            debug!(session_id = %id, "expired session removed on access");
        }
    }
}
