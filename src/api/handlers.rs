//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use tracing::info;

use crate::cache::{CacheRegistry, KeySource};
use crate::error::{CacheError, Result};
use crate::models::{
    CacheListResponse, CacheResponse, ClearResponse, DiscardRequest, DiscardResponse,
    HealthResponse, PurgeResponse,
};

/// Application state shared across all handlers.
///
/// The registry is internally shared, so cloning the state is cheap.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub registry: CacheRegistry,
}

impl AppState {
    pub fn new(registry: CacheRegistry) -> Self {
        Self { registry }
    }
}

/// Handler for GET /caches
///
/// Lists every registered cache with its statistics.
pub async fn list_handler(State(state): State<AppState>) -> Json<CacheListResponse> {
    Json(CacheListResponse::new(
        state.registry.defaults(),
        state.registry.snapshot(),
    ))
}

/// Handler for GET /caches/:name
pub async fn info_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CacheResponse>> {
    let cache = state.registry.require(&name)?;
    let info = cache.cache_info();

    Ok(Json(CacheResponse::new(name, info)))
}

/// Handler for DELETE /caches/:name
///
/// Drops every entry and resets the statistics of one cache.
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ClearResponse>> {
    state.registry.require(&name)?.cache_clear();
    info!(cache = %name, "cache cleared through admin API");

    Ok(Json(ClearResponse::new(name)))
}

/// Handler for POST /caches/:name/discard
///
/// Rebuilds the key from JSON arguments and drops that one entry.
pub async fn discard_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: std::result::Result<Json<DiscardRequest>, JsonRejection>,
) -> Result<Json<DiscardResponse>> {
    let Json(req) = body.map_err(|rejection| CacheError::InvalidRequest(rejection.body_text()))?;
    let cache = state.registry.require(&name)?;
    let key = req.cache_key()?;
    let discarded = cache.discard_key(&key);

    Ok(Json(DiscardResponse {
        name,
        key: key.to_string(),
        discarded,
    }))
}

/// Handler for POST /caches/:name/purge
///
/// Drops the completed entries that have outlived the cache's TTL.
pub async fn purge_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<PurgeResponse>> {
    let removed = state.registry.require(&name)?.purge_expired();

    Ok(Json(PurgeResponse { name, removed }))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
