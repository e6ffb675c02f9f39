//! Participant side of the relay protocol.
//!
//! A [`Participant`] keeps one connection to the relay alive for as long as its
//! [`ParticipantHandle`] exists:
//! - pings the relay on a fixed interval once connected
//! - reconnects after a fixed delay whenever the connection drops, forever
//! - hides echoes of its own draw events from the rendering side

pub use client::{Participant, ParticipantError, ParticipantEvent, ParticipantHandle};
pub use config::{
    ParticipantConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_HEARTBEAT_INTERVAL,
    DEFAULT_RECONNECT_DELAY,
};

mod client;
mod config;
