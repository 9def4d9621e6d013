use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod admin;
mod config;
mod error;
mod guard;
mod state;

use config::Config;
use guard::{LoginGuard, Reaper, REAP_INTERVAL};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        "Login guard: {} attempts, {} minute block",
        config.guard.max_attempts,
        config.guard.block_duration_minutes
    );

    let login_guard = Arc::new(LoginGuard::new(config.guard));
    let reaper = Reaper::start(login_guard.clone(), REAP_INTERVAL);

    let state = Arc::new(AppState::new(login_guard, config.admin));

    let app = admin::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("login-guard server listening on {}", config.bind_addr);
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    reaper.stop().await;
    served?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
