// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfpress: PDF compression service.
//
// Entry point. Initialises logging, loads configuration, probes the available
// strategies once, then serves HTTP until Ctrl-C or SIGTERM.

use std::process::ExitCode;
use std::sync::Arc;

use pdfpress_core::ServerConfig;
use pdfpress_document::Capabilities;
use pdfpress_server::sweeper::Sweeper;
use pdfpress_server::{AppState, app};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "pdfpress failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> pdfpress_core::error::Result<()> {
    let config = ServerConfig::load()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host,
        port = config.port,
        max_upload_mib = config.max_upload_mib(),
        "pdfpress starting"
    );

    let capabilities = Capabilities::probe();
    let state = AppState::new(config, capabilities)?;
    let sweeper = Sweeper::start(
        Arc::clone(&state.staging),
        state.config.download_ttl(),
        state.config.sweep_interval(),
    );

    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, strategies = ?state.orchestrator.strategies(), "listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.stop().await;
    info!("pdfpress stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(%err, "cannot listen for SIGTERM");
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
    info!("shutdown signal received");
}
