//! Cerebra HTTP server.
//!
//! Run with: cargo run -p cerebra-web

use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = cerebra_config::Config::load()?;
    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;

    info!(vector_store = %cfg.vector_store.url, "Starting Cerebra server");
    let state = cerebra_web::state::AppState::from_config(cfg).await?;
    let app = cerebra_web::router::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
