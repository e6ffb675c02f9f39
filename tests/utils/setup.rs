#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use canvas_relay::{
    websockets::ConnectionId, DrawEvent, EventLog, InMemoryConnectionManager, MessageRouter, Relay,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// A participant wired straight into the relay, without a transport
pub struct TestParticipant {
    pub name: String,
    pub connection_id: ConnectionId,
    pub inbox: Mutex<mpsc::UnboundedReceiver<String>>,
}

pub struct TestSetup {
    pub relay: Arc<Relay>,
    pub router: MessageRouter,
    pub participants: Mutex<Vec<Arc<TestParticipant>>>,
}

pub struct TestSetupBuilder {
    participants: Vec<String>,
    max_history: usize,
    replay_empty_history: bool,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            participants: vec![],
            max_history: 1000,
            replay_empty_history: false,
        }
    }

    pub fn with_participants(mut self, participants: Vec<&str>) -> Self {
        self.participants = participants.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_three_participants(self) -> Self {
        self.with_participants(vec!["alice", "bob", "charlie"])
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn with_replay_empty_history(mut self) -> Self {
        self.replay_empty_history = true;
        self
    }

    pub async fn build(self) -> TestSetup {
        let relay = Arc::new(
            Relay::new(
                EventLog::new(self.max_history),
                Arc::new(InMemoryConnectionManager::new()),
            )
            .with_replay_empty_history(self.replay_empty_history),
        );

        let setup = TestSetup {
            router: MessageRouter::new(relay.clone()),
            relay,
            participants: Mutex::new(Vec::new()),
        };

        // Connect participants in order
        for name in &self.participants {
            setup.connect(name).await;
        }

        setup
    }
}

impl TestSetup {
    pub async fn participant(&self, name: &str) -> Arc<TestParticipant> {
        self.participants
            .lock()
            .await
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .unwrap_or_else(|| panic!("No participant named {}", name))
    }

    pub async fn participant_names(&self) -> Vec<String> {
        self.participants
            .lock()
            .await
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }

    /// Open a connection for `name` the way the upgrade handler does
    pub async fn connect(&self, name: &str) -> Arc<TestParticipant> {
        let (tx, rx) = mpsc::unbounded_channel();
        let participant = Arc::new(TestParticipant {
            name: name.to_string(),
            connection_id: Uuid::new_v4(),
            inbox: Mutex::new(rx),
        });

        self.relay.on_connect(participant.connection_id, tx).await;
        self.participants.lock().await.push(participant.clone());
        participant
    }

    /// Close `name`'s connection: its inbox is dropped before the relay is told
    pub async fn disconnect(&self, name: &str) {
        let participant = {
            let mut participants = self.participants.lock().await;
            let index = participants
                .iter()
                .position(|p| p.name == name)
                .unwrap_or_else(|| panic!("No participant named {}", name));
            participants.remove(index)
        };
        participant.inbox.lock().await.close();
        self.relay.on_disconnect(participant.connection_id).await;
    }
}

/// A draw event attributed to `client_id`
pub fn stroke(client_id: &str, timestamp: u64) -> DrawEvent {
    serde_json::from_value(json!({
        "fromX": timestamp,
        "fromY": 10,
        "toX": timestamp + 4,
        "toY": 12,
        "color": "#1e90ff",
        "size": 3,
        "timestamp": timestamp,
        "clientId": client_id
    }))
    .unwrap()
}
