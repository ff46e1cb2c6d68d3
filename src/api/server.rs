//! Admin Server
//!
//! Runs the admin router together with the expiry sweep until shutdown.

use std::future::Future;

use tokio::net::TcpListener;
use tracing::{info, warn};

use super::handlers::AppState;
use super::routes::create_router;
use crate::tasks::spawn_sweep_task;

/// Serves the admin API on `listener` until `shutdown` resolves.
///
/// The expiry sweep runs every `sweep_interval_secs` for the lifetime of the
/// server and is aborted once the server has stopped.
pub async fn serve<F>(
    listener: TcpListener,
    state: AppState,
    sweep_interval_secs: u64,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let sweep_handle = spawn_sweep_task(state.registry.clone(), sweep_interval_secs);
    info!("Background sweep task started");

    let app = create_router(state);
    if let Ok(addr) = listener.local_addr() {
        info!("Server listening on http://{}", addr);
    }

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    sweep_handle.abort();
    warn!("Sweep task aborted");
    result
}
