//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, discard_handler, health_handler, info_handler, list_handler, purge_handler,
    AppState,
};

/// Creates the admin router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /caches` - Statistics of every registered cache
/// - `GET /caches/:name` - Statistics of one cache
/// - `DELETE /caches/:name` - Clear one cache
/// - `POST /caches/:name/discard` - Drop the entry for the given arguments
/// - `POST /caches/:name/purge` - Drop expired entries
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/caches", get(list_handler))
        .route("/caches/:name", get(info_handler).delete(clear_handler))
        .route("/caches/:name/discard", post(discard_handler))
        .route("/caches/:name/purge", post(purge_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
