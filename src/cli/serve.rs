//! Serve command - run the HTTP gateway

use anyhow::Context;
use oscal_gateway::config::GatewayArgs;
use oscal_gateway::server::{build_router, AppState};
use oscal_gateway::store::create_content_store;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Run the gateway until Ctrl-C
pub async fn run_serve(args: GatewayArgs) -> anyhow::Result<()> {
    let config = args.into_config()?;

    if config.auth_disabled() {
        warn!("mock mode: write routes accept requests without an API key");
    } else if config.api_key.is_none() {
        warn!("APP_API_KEY is not set: every write route will answer 401");
    }

    let store = create_content_store(&config.store).await?;
    let bind = config.bind.clone();
    let state = AppState::new(store, config)?;
    let app = build_router(state)?;

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(addr = %listener.local_addr()?, "oscal-gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("oscal-gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
