//! Tutor API server
//!
//! Run with: cargo run -p tutor-web --bin tutor-server

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tutor_config::Config;
use tutor_web::router::build_router;
use tutor_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting tutor API server...");

    let state = AppState::from_config(&config);
    if state.providers.is_available() {
        info!(model = ?state.providers.model(), "Remote provider enabled");
    } else {
        warn!("Remote provider not configured - using local models only");
    }
    info!(
        generation = %config.models.generation,
        translation = %config.models.translation,
        intent = %config.models.intent,
        workers = config.server.workers,
        "Local models load on first use"
    );

    let app = build_router(state);

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    info!(addr = %listener.local_addr()?, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
