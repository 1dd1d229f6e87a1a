//! Open connections, indexed by connection id.

use std::collections::HashMap;
use std::sync::Arc;

use cadence_core::ClientId;
use tokio::sync::RwLock;

use super::connection::ClientConnection;

/// Registry of live widget connections.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ClientId, Arc<ClientConnection>>>,
}

impl ConnectionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection.
    pub async fn add(&self, connection: Arc<ClientConnection>) {
        let _ = self
            .connections
            .write()
            .await
            .insert(connection.id.clone(), connection);
    }

    /// Unregister a connection. Returns it if it was present.
    pub async fn remove(&self, id: &ClientId) -> Option<Arc<ClientConnection>> {
        self.connections.write().await.remove(id)
    }

    /// Number of open connections.
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }
}
