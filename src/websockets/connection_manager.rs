use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Identity of one transport connection, assigned on upgrade
pub type ConnectionId = Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("connection {0} is not registered")]
    NotRegistered(ConnectionId),

    #[error("connection {0} is no longer open")]
    Closed(ConnectionId),

    #[error("message could not be serialized")]
    Unencodable,
}

/// A registered participant connection.
///
/// The receiving half of `sender` is owned by the connection task, so the
/// handle reports closed as soon as that task has finished.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub connected_at: DateTime<Utc>,
    sender: mpsc::UnboundedSender<String>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id,
            connected_at: Utc::now(),
            sender,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queue a serialized frame for this connection
    pub fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        self.sender
            .send(message.to_string())
            .map_err(|_| DeliveryError::Closed(self.id))
    }
}

#[async_trait]
pub trait ConnectionManager: Send + Sync {
    async fn add_connection(&self, id: ConnectionId, sender: mpsc::UnboundedSender<String>);

    /// Removing an unknown connection is a no-op
    async fn remove_connection(&self, id: &ConnectionId) -> Option<ConnectionHandle>;

    async fn send_to(&self, id: &ConnectionId, message: &str) -> Result<(), DeliveryError>;

    /// Point-in-time copy of the registered handles, safe to iterate while
    /// connections come and go
    async fn members(&self) -> Vec<ConnectionHandle>;

    async fn size(&self) -> usize;
}

pub struct InMemoryConnectionManager {
    // connection id -> handle
    connections: Arc<RwLock<HashMap<ConnectionId, ConnectionHandle>>>,
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(&self, id: ConnectionId, sender: mpsc::UnboundedSender<String>) {
        let mut connections = self.connections.write().await;
        connections.insert(id, ConnectionHandle::new(id, sender));
    }

    async fn remove_connection(&self, id: &ConnectionId) -> Option<ConnectionHandle> {
        let mut connections = self.connections.write().await;
        connections.remove(id)
    }

    async fn send_to(&self, id: &ConnectionId, message: &str) -> Result<(), DeliveryError> {
        let connections = self.connections.read().await;
        match connections.get(id) {
            Some(handle) => handle.deliver(message),
            None => Err(DeliveryError::NotRegistered(*id)),
        }
    }

    async fn members(&self) -> Vec<ConnectionHandle> {
        let connections = self.connections.read().await;
        connections.values().cloned().collect()
    }

    async fn size(&self) -> usize {
        self.connections.read().await.len()
    }
}
