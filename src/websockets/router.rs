use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::relay::Relay;

use super::connection_manager::ConnectionId;
use super::messages::{DecodeError, Message};
use super::socket::MessageHandler;

/// What the router did with one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Drew { delivered: usize },
    Cleared { delivered: usize },
    Ponged,
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    Malformed,
    MissingType,
    UnknownType(String),
    InvalidPayload(String),
    /// A relay-originated message type sent by a participant
    WrongDirection(&'static str),
}

/// Routes decoded participant messages to the relay.
///
/// Nothing a participant sends can close its connection from here: every
/// rejected frame is logged and dropped.
pub struct MessageRouter {
    relay: Arc<Relay>,
}

impl MessageRouter {
    pub fn new(relay: Arc<Relay>) -> Self {
        Self { relay }
    }

    pub async fn dispatch(&self, connection_id: &ConnectionId, text: &str) -> RouteOutcome {
        let message = match Message::decode(text) {
            Ok(message) => message,
            Err(e) => {
                let reason = match &e {
                    DecodeError::Malformed(_) => IgnoreReason::Malformed,
                    DecodeError::MissingType => IgnoreReason::MissingType,
                    DecodeError::UnknownType(kind) => IgnoreReason::UnknownType(kind.clone()),
                    DecodeError::InvalidPayload { kind, .. } => {
                        IgnoreReason::InvalidPayload(kind.clone())
                    }
                };
                if matches!(reason, IgnoreReason::UnknownType(_)) {
                    debug!(connection_id = %connection_id, error = %e, "Ignoring message");
                } else {
                    warn!(
                        connection_id = %connection_id,
                        error = %e,
                        "Failed to parse WebSocket message"
                    );
                }
                return RouteOutcome::Ignored(reason);
            }
        };

        match message {
            Message::Draw { data } => {
                let report = self.relay.submit_draw(data).await;
                RouteOutcome::Drew {
                    delivered: report.delivered,
                }
            }
            Message::Clear => {
                debug!(connection_id = %connection_id, "Clear requested");
                let report = self.relay.clear().await;
                RouteOutcome::Cleared {
                    delivered: report.delivered,
                }
            }
            Message::Ping => {
                if let Err(e) = self.relay.reply_pong(connection_id).await {
                    debug!(connection_id = %connection_id, error = %e, "Dropped pong");
                }
                RouteOutcome::Ponged
            }
            other => {
                debug!(
                    connection_id = %connection_id,
                    message_type = other.kind(),
                    "Ignoring relay-originated message type from participant"
                );
                RouteOutcome::Ignored(IgnoreReason::WrongDirection(other.kind()))
            }
        }
    }
}

#[async_trait]
impl MessageHandler for MessageRouter {
    async fn handle_message(&self, connection_id: &ConnectionId, message: String) {
        let outcome = self.dispatch(connection_id, &message).await;
        debug!(connection_id = %connection_id, outcome = ?outcome, "Routed message");
    }
}
