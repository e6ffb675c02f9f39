use std::sync::Arc;
use thiserror::Error;

use crate::config::RelayConfig;
use crate::history::EventLog;
use crate::relay::Relay;
use crate::websockets::{ConnectionManager, InMemoryConnectionManager};

/// Shared application state handed to every axum handler
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub config: Arc<RelayConfig>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        Self::with_connection_manager(config, Arc::new(InMemoryConnectionManager::new()))
    }

    pub fn with_connection_manager(
        config: RelayConfig,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        let relay = Relay::new(EventLog::new(config.max_history), connection_manager)
            .with_replay_empty_history(config.replay_empty_history);
        Self {
            relay: Arc::new(relay),
            config: Arc::new(config),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid configuration for {key}: {message}")]
    Config { key: &'static str, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn config(key: &'static str, message: impl Into<String>) -> Self {
        AppError::Config {
            key,
            message: message.into(),
        }
    }
}
