//! API Module
//!
//! HTTP handlers and routing for the cache admin REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /caches` - List registered caches with statistics
//! - `GET /caches/:name` - Statistics of one cache
//! - `DELETE /caches/:name` - Clear one cache
//! - `POST /caches/:name/discard` - Discard the entry for given arguments
//! - `POST /caches/:name/purge` - Purge expired entries

pub mod handlers;
pub mod routes;
mod server;

pub use handlers::*;
pub use routes::create_router;
pub use server::serve;
