use std::time::Duration;

use crate::history::DEFAULT_MAX_HISTORY;
use crate::shared::AppError;
use crate::websockets::DEFAULT_SEND_TIMEOUT;

const DEFAULT_PORT: u16 = 3000;

/// Relay settings, read from the environment at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Address the listener binds to
    pub bind_addr: String,
    /// Path of the WebSocket endpoint
    pub ws_path: String,
    /// Events kept for replay to late joiners
    pub max_history: usize,
    /// Send `history` to newcomers even when there is nothing to replay
    pub replay_empty_history: bool,
    /// A participant whose socket stalls a send this long is disconnected
    pub send_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            ws_path: "/ws".to_string(),
            max_history: DEFAULT_MAX_HISTORY,
            replay_empty_history: false,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

impl RelayConfig {
    /// Build from `RELAY_*` environment variables (and `PORT`), falling back to defaults
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = match lookup("RELAY_BIND_ADDR") {
            Some(addr) => addr,
            None => match lookup("PORT") {
                Some(port) => {
                    let port: u16 = port
                        .trim()
                        .parse()
                        .map_err(|e| AppError::config("PORT", format!("{}", e)))?;
                    format!("0.0.0.0:{}", port)
                }
                None => defaults.bind_addr,
            },
        };

        let ws_path = lookup("RELAY_WS_PATH").unwrap_or(defaults.ws_path);
        if !ws_path.starts_with('/') {
            return Err(AppError::config("RELAY_WS_PATH", "must start with '/'"));
        }

        let max_history = match lookup("RELAY_MAX_HISTORY") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|e| AppError::config("RELAY_MAX_HISTORY", format!("{}", e)))?,
            None => defaults.max_history,
        };
        if max_history == 0 {
            return Err(AppError::config("RELAY_MAX_HISTORY", "must be at least 1"));
        }

        let replay_empty_history = match lookup("RELAY_REPLAY_EMPTY_HISTORY") {
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| AppError::config("RELAY_REPLAY_EMPTY_HISTORY", "expected a boolean"))?,
            None => defaults.replay_empty_history,
        };

        let send_timeout = match lookup("RELAY_SEND_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| AppError::config("RELAY_SEND_TIMEOUT_MS", format!("{}", e)))?,
            None => defaults.send_timeout,
        };
        if send_timeout.is_zero() {
            return Err(AppError::config("RELAY_SEND_TIMEOUT_MS", "must be at least 1"));
        }

        Ok(Self {
            bind_addr,
            ws_path,
            max_history,
            replay_empty_history,
            send_timeout,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
