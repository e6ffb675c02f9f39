use axum::{
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::relay::Relay;
use crate::shared::AppState;

use super::router::MessageRouter;
use super::socket::Connection;

/// WebSocket endpoint participants connect to
///
/// GET {ws_path}
#[instrument(name = "websocket_handler", skip(ws, app_state))]
pub async fn websocket_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    info!("WebSocket connection requested");
    let send_timeout = app_state.config.send_timeout;
    ws.on_upgrade(move |socket| {
        handle_websocket_connection(socket, app_state.relay, send_timeout)
    })
}

/// Drive one upgraded connection from registration to cleanup
async fn handle_websocket_connection(
    socket: WebSocket,
    relay: Arc<Relay>,
    send_timeout: Duration,
) {
    let connection_id = Uuid::new_v4();
    info!(connection_id = %connection_id, "WebSocket connection established");

    // Create the outbound channel (relay -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    relay.on_connect(connection_id, outbound_sender).await;

    let message_handler = Arc::new(MessageRouter::new(Arc::clone(&relay)));
    let connection = Connection::new(
        connection_id,
        Box::new(socket),
        outbound_receiver,
        message_handler,
    )
    .with_send_timeout(send_timeout);

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => {
            info!(connection_id = %connection_id, "WebSocket connection closed cleanly");
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                error = %e,
                "WebSocket connection error"
            );
        }
    }

    // Cleanup: remove from the registry and announce the new count
    relay.on_disconnect(connection_id).await;
}
