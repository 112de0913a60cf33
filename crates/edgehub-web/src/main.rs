use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use edgehub_core::{MemoryEdgeCache, ReqwestHttpClient};
use edgehub_web::cli::Cli;
use edgehub_web::{
    build_router, logging, stream_client, upstream_client, AppState, GatewayConfig, StartupError,
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let cli = Cli::parse();
    let mut config = GatewayConfig::from_env()?;
    cli.apply(&mut config);
    logging::init(&config.logging)?;

    let cache = MemoryEdgeCache::default();
    cache.spawn_sweeper(config.cache_sweep_interval());

    let state = AppState::from_config(
        &config,
        Arc::new(ReqwestHttpClient::with_client(upstream_client()?)),
        Arc::new(cache),
        stream_client()?,
    );

    let listener = TcpListener::bind(&config.bind).await?;
    info!(
        bind = %config.bind,
        bridge_configured = config.bridge.is_some(),
        media_hosts = config.media_allowed_hosts.hosts().len(),
        "edgehub listening"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("edgehub stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
