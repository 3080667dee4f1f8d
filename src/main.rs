//! LogHub Server - Binary Entry Point
//!
//! Loads configuration, restores snapshots, serves HTTP until SIGINT or
//! SIGTERM, then flushes pending snapshots.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use loghub::api::{create_router, AppState};
use loghub::config::Config;
use loghub::service::IngestionService;
use loghub::simulator::LogSimulator;
use loghub::utils::cleanup_temp_files;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    let cfg = Config::from_env().context("invalid configuration")?;
    info!(
        port = cfg.port,
        data_dir = %cfg.data_dir.display(),
        max_logs = cfg.max_logs,
        write_delay_ms = cfg.write_delay_ms,
        environment = %cfg.environment,
        "Starting {} v{}",
        loghub::NAME,
        loghub::VERSION
    );

    match cleanup_temp_files(&[cfg.events_path(), cfg.aliases_path()]) {
        Ok(0) => {}
        Ok(n) => info!(removed = n, "Removed leftover temp files"),
        Err(e) => warn!(error = %e, "Could not clean temp files"),
    }

    let service = Arc::new(IngestionService::new(cfg.engine(), Arc::new(cfg.snapshot_store())));
    info!(events = service.count(), aliases = service.alias_count(), "State restored");

    let simulator = cfg
        .simulate
        .then(|| LogSimulator::start(service.clone(), cfg.simulate_interval()));

    let state = Arc::new(AppState::new(service.clone()));
    let shutdown = state.shutdown_token();
    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Live streams never finish on their own
            shutdown.cancel();
        })
        .await
        .context("server error")?;

    info!("Shutting down");
    if let Some(simulator) = simulator {
        simulator.stop();
    }
    service.shutdown().await.context("final snapshot flush failed")?;
    info!("Bye");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
