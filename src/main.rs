//! Pandoxed - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Build HTTP router with routes and middleware
//! 3. Start server on configured address
//! 4. Drain in-flight requests on Ctrl-C / SIGTERM

use std::net::SocketAddr;

use pandoxed::{build_router, config::Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        converter = %config.pandoc_path,
        pdf_engine = %config.pdf_engine,
        timeout_secs = config.pandoc_timeout_secs,
        max_body_bytes = config.max_body_bytes,
        "Configuration loaded"
    );
    if config.basic_auth_enabled {
        if config.basic_auth_username.is_empty() || config.basic_auth_password.is_empty() {
            tracing::warn!(
                "Basic auth is enabled with empty credentials; every conversion will be rejected"
            );
        }
    } else {
        tracing::warn!("Basic auth is disabled; /md-to-pdf is open to anyone who can reach it");
    }

    let app = build_router(&config);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // ConnectInfo gives the access log the client's address
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on the first Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
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
                tracing::error!(error = %err, "failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received, draining connections");
}
