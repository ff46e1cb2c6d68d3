//! Dynamo Cache - admin server
//!
//! Hosts a cache registry behind the admin API so the endpoints and the
//! expiry sweep can be exercised locally. The registry carries the default
//! cache options from the environment; services embedding the cache core
//! create their caches through it with [`CacheRegistry::create_cache`] and
//! call [`dynamo_cache::api::serve`].

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dynamo_cache::api::{self, AppState};
use dynamo_cache::{CacheRegistry, Config};

/// Main entry point for the cache admin server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Create the cache registry with the configured default options
/// 4. Bind the configured port and serve the admin API with the sweep task
/// 5. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dynamo_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Dynamo cache admin server");

    let config = Config::from_env();
    let options = config
        .cache_options()
        .context("invalid default cache configuration")?;
    info!(
        "Configuration loaded: port={}, sweep_interval={}s, default cache options={:?}",
        config.server_port, config.sweep_interval, options
    );

    let registry =
        CacheRegistry::with_defaults(options).context("invalid default cache configuration")?;
    let state = AppState::new(registry);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    api::serve(listener, state, config.sweep_interval, shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
