use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::connection_manager::ConnectionId;

/// Simple WebSocket abstraction - all we care about is send/receive
#[async_trait]
pub trait SocketWrapper: Send {
    /// Send a text message to the client
    async fn send_message(&mut self, message: String) -> Result<(), SocketError>;

    /// Receive the next text message from the client (None if connection closed)
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), SocketError>;
}

/// Handler for incoming WebSocket messages
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle an incoming message from the client
    async fn handle_message(&self, connection_id: &ConnectionId, message: String);
}

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("send did not complete within {0:?}")]
    SendTimedOut(Duration),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Direct implementation on axum's WebSocket
#[async_trait]
impl SocketWrapper for WebSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.send(Message::Text(message))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        loop {
            match self.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Binary and control frames carry nothing for us
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(SocketError::ReceiveFailed(e.to_string())),
            }
        }
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// How long a single outbound frame may take before the peer is treated as gone
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle of one participant connection. Errors do not change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

/// Connection represents a managed WebSocket connection
/// It is used to send and receive messages to and from the client
/// The outbound receiver is fed by the registry's handle for this connection
pub struct Connection {
    pub id: ConnectionId,
    state: ConnectionState,
    socket: Box<dyn SocketWrapper>,
    outbound_receiver: mpsc::UnboundedReceiver<String>,
    message_handler: Arc<dyn MessageHandler>,
    send_timeout: Duration,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        socket: Box<dyn SocketWrapper>,
        outbound_receiver: mpsc::UnboundedReceiver<String>,
        message_handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            id,
            state: ConnectionState::Open,
            socket,
            outbound_receiver,
            message_handler,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Peers that stop reading are dropped once a send stalls this long;
    /// until then their outbound queue keeps growing
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Run the connection - handles both sending and receiving until disconnect.
    ///
    /// Receive errors are logged and the loop keeps going; the transport reports
    /// the close that follows them. A failed or timed out send ends the connection.
    pub async fn run(mut self) -> Result<(), SocketError> {
        while self.state == ConnectionState::Open {
            tokio::select! {
                // Handle outbound messages (from the relay to the client)
                msg = self.outbound_receiver.recv() => {
                    match msg {
                        Some(message) => {
                            let sent = tokio::time::timeout(
                                self.send_timeout,
                                self.socket.send_message(message),
                            )
                            .await
                            .unwrap_or(Err(SocketError::SendTimedOut(self.send_timeout)));

                            if let Err(e) = sent {
                                self.state = ConnectionState::Closed;
                                return Err(e);
                            }
                        }
                        None => self.transition_closed("outbound channel closed"),
                    }
                }

                // Handle inbound messages (from the client to the relay)
                msg = self.socket.receive_message() => {
                    match msg {
                        Ok(Some(message)) => {
                            self.message_handler
                                .handle_message(&self.id, message)
                                .await;
                        }
                        Ok(None) => self.transition_closed("client disconnected"),
                        Err(e) => {
                            warn!(
                                connection_id = %self.id,
                                error = %e,
                                "Transport error on connection"
                            );
                        }
                    }
                }
            }
        }

        // Clean disconnect
        let _ = self.socket.close().await;
        Ok(())
    }

    fn transition_closed(&mut self, reason: &str) {
        debug!(connection_id = %self.id, reason = reason, "Connection closed");
        self.state = ConnectionState::Closed;
    }
}
