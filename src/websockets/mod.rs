// Public API
pub use broadcast::{BroadcastDispatcher, BroadcastReport};
pub use connection_manager::{
    ConnectionHandle, ConnectionId, ConnectionManager, DeliveryError, InMemoryConnectionManager,
};
pub use handler::websocket_handler;
pub use messages::{DecodeError, DrawEvent, Message, KNOWN_TYPES};
pub use router::{IgnoreReason, MessageRouter, RouteOutcome};
pub use socket::{
    Connection, ConnectionState, MessageHandler, SocketError, SocketWrapper, DEFAULT_SEND_TIMEOUT,
};

// Internal modules
mod broadcast;
mod connection_manager;
mod handler;
mod messages;
mod router;
mod socket;
