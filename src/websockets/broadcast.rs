use std::sync::Arc;
use tracing::{debug, error};

use super::connection_manager::{ConnectionId, ConnectionManager, DeliveryError};
use super::messages::Message;

/// Outcome of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub skipped: usize,
}

/// Serializes outbound messages and fans them out over the connection registry.
///
/// Failures on one connection never stop delivery to the rest and are never
/// surfaced to the caller beyond the returned report.
#[derive(Clone)]
pub struct BroadcastDispatcher {
    connection_manager: Arc<dyn ConnectionManager>,
}

impl BroadcastDispatcher {
    pub fn new(connection_manager: Arc<dyn ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    pub async fn broadcast(&self, message: &Message) -> BroadcastReport {
        let message_json = match message.encode() {
            Ok(json) => json,
            Err(e) => {
                error!(kind = message.kind(), error = %e, "Failed to serialize broadcast");
                return BroadcastReport::default();
            }
        };

        let mut report = BroadcastReport::default();
        for handle in self.connection_manager.members().await {
            if !handle.is_open() {
                debug!(connection_id = %handle.id, "Skipping connection that is not open");
                report.skipped += 1;
                continue;
            }

            // Delivery goes through the registry so a member removed since the
            // snapshot was taken is skipped
            match self.connection_manager.send_to(&handle.id, &message_json).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    debug!(connection_id = %handle.id, error = %e, "Broadcast delivery failed");
                    report.skipped += 1;
                }
            }
        }

        debug!(
            kind = message.kind(),
            delivered = report.delivered,
            skipped = report.skipped,
            "Broadcast complete"
        );
        report
    }

    pub async fn broadcast_user_count(&self) -> BroadcastReport {
        let count = self.connection_manager.size().await;
        self.broadcast(&Message::user_count(count)).await
    }

    /// Unicast to a single connection
    pub async fn send_to(&self, id: &ConnectionId, message: &Message) -> Result<(), DeliveryError> {
        let message_json = match message.encode() {
            Ok(json) => json,
            Err(e) => {
                error!(kind = message.kind(), error = %e, "Failed to serialize message");
                return Err(DeliveryError::Unencodable);
            }
        };
        self.connection_manager.send_to(id, &message_json).await
    }
}
