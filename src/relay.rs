use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::history::EventLog;
use crate::websockets::{
    BroadcastDispatcher, BroadcastReport, ConnectionId, ConnectionManager, DeliveryError,
    DrawEvent, Message,
};

/// Relay-lifetime coordinator owning the replay log and the connection registry.
///
/// Every state change and the fan-out it causes run under `sequencer`, so all
/// participants observe changes in the order they reached the relay and a
/// joining participant's history is queued ahead of anything that follows it.
pub struct Relay {
    event_log: EventLog,
    connection_manager: Arc<dyn ConnectionManager>,
    dispatcher: BroadcastDispatcher,
    replay_empty_history: bool,
    sequencer: Mutex<()>,
}

impl Relay {
    pub fn new(event_log: EventLog, connection_manager: Arc<dyn ConnectionManager>) -> Self {
        let dispatcher = BroadcastDispatcher::new(Arc::clone(&connection_manager));
        Self {
            event_log,
            connection_manager,
            dispatcher,
            replay_empty_history: false,
            sequencer: Mutex::new(()),
        }
    }

    /// Send a `history` frame to newcomers even when the log is empty
    pub fn with_replay_empty_history(mut self, enabled: bool) -> Self {
        self.replay_empty_history = enabled;
        self
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn connection_manager(&self) -> &Arc<dyn ConnectionManager> {
        &self.connection_manager
    }

    pub fn dispatcher(&self) -> &BroadcastDispatcher {
        &self.dispatcher
    }

    /// Register a new connection, replay history to it, announce the new count
    pub async fn on_connect(&self, id: ConnectionId, sender: mpsc::UnboundedSender<String>) {
        let _turn = self.sequencer.lock().await;

        self.connection_manager.add_connection(id, sender).await;

        let snapshot = self.event_log.snapshot().await;
        if !snapshot.is_empty() || self.replay_empty_history {
            let events = snapshot.len();
            match self.dispatcher.send_to(&id, &Message::history(snapshot)).await {
                Ok(()) => debug!(connection_id = %id, events = events, "Sent history"),
                Err(e) => debug!(connection_id = %id, error = %e, "Failed to send history"),
            }
        }

        self.dispatcher.broadcast_user_count().await;
        let participants = self.connection_manager.size().await;
        info!(connection_id = %id, participants = participants, "Participant connected");
    }

    /// Drop a connection from the registry and announce the new count
    pub async fn on_disconnect(&self, id: ConnectionId) {
        let _turn = self.sequencer.lock().await;

        match self.connection_manager.remove_connection(&id).await {
            Some(handle) => {
                let session_secs = (chrono::Utc::now() - handle.connected_at).num_seconds();
                info!(
                    connection_id = %id,
                    session_secs = session_secs,
                    "Participant disconnected"
                );
            }
            None => debug!(connection_id = %id, "Disconnect for unregistered connection"),
        }

        self.dispatcher.broadcast_user_count().await;
    }

    /// Record a draw event and fan it out to everyone, the sender included
    pub async fn submit_draw(&self, event: DrawEvent) -> BroadcastReport {
        let _turn = self.sequencer.lock().await;

        let message = Message::draw(event.clone());
        self.event_log.append(event).await;
        self.dispatcher.broadcast(&message).await
    }

    /// Wipe the shared history and tell everyone
    pub async fn clear(&self) -> BroadcastReport {
        let _turn = self.sequencer.lock().await;

        self.event_log.reset().await;
        self.dispatcher.broadcast(&Message::Clear).await
    }

    /// Answer a liveness probe on the connection that sent it
    pub async fn reply_pong(&self, id: &ConnectionId) -> Result<(), DeliveryError> {
        self.dispatcher.send_to(id, &Message::Pong).await
    }

    /// Deregister every connection. Each connection task sees its outbound
    /// channel close and shuts its socket.
    pub async fn close_all(&self) -> usize {
        let _turn = self.sequencer.lock().await;

        let ids: Vec<ConnectionId> = self
            .connection_manager
            .members()
            .await
            .into_iter()
            .map(|handle| handle.id)
            .collect();
        for id in &ids {
            self.connection_manager.remove_connection(id).await;
        }

        info!(closed = ids.len(), "Closed all participant connections");
        ids.len()
    }

    pub async fn participant_count(&self) -> usize {
        self.connection_manager.size().await
    }
}
