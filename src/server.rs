use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::shared::{AppError, AppState};
use crate::websockets::websocket_handler;

/// Routes served by the relay: a single WebSocket endpoint
pub fn build_router(app_state: AppState) -> Router {
    let ws_path = app_state.config.ws_path.clone();
    Router::new()
        .route(&ws_path, get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, app_state: AppState, shutdown: F) -> Result<(), AppError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let ws_path = app_state.config.ws_path.clone();
    info!(
        addr = %listener.local_addr()?,
        ws_path = %ws_path,
        max_history = app_state.config.max_history,
        "Relay listening"
    );

    // Upgraded sockets outlive the HTTP server, so release them explicitly
    let relay = app_state.relay.clone();
    let shutdown = async move {
        shutdown.await;
        relay.close_all().await;
    };

    axum::serve(listener, build_router(app_state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Relay stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
