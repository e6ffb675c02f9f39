// Library crate for the canvas relay
// This file exposes the public API for the binary and integration tests

pub mod config;
pub mod history;
pub mod participant;
pub mod relay;
pub mod server;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::RelayConfig;
pub use history::EventLog;
pub use participant::{Participant, ParticipantConfig, ParticipantEvent, ParticipantHandle};
pub use relay::Relay;
pub use shared::{AppError, AppState};
pub use websockets::{
    BroadcastDispatcher, ConnectionManager, DrawEvent, InMemoryConnectionManager, Message,
    MessageRouter,
};
