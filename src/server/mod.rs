//! Prediction service: an HTML form in front of the loaded model.

pub mod handlers;
pub mod page;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::Result;

/// Bind and serve until Ctrl-C.
pub async fn run_server(config: &ServerConfig, state: AppState) -> Result<()> {
    let classes = state.model.classes().len();
    let app = create_router(state);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!(
        classes,
        "🚀 Prediction service listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Prediction service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
