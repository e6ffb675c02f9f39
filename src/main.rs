use canvas_relay::{server, AppError, AppState, RelayConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canvas_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting canvas relay");

    let config = RelayConfig::from_env()?;
    let listener = TcpListener::bind(&config.bind_addr).await?;
    let app_state = AppState::new(config);

    server::serve(listener, app_state, server::shutdown_signal()).await
}
