//! HTTP route handlers for the membergraph API
//!
//! This module contains all endpoint handlers including:
//! - The GraphQL endpoint and playground
//! - Health check and status endpoints

pub mod graphql;
pub mod health;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::config::Config;
use crate::graphql::{build_schema, LoaderOptions, MembergraphSchema, PreloadPolicy};
use crate::store::Store;

pub use graphql::graphql_router;
pub use health::health_router;

/// Shared application state for every route
#[derive(Clone)]
pub struct AppState {
    /// Schema without per-request data
    pub schema: MembergraphSchema,
    /// Store adapter shared by every request
    pub store: Arc<dyn Store>,
    /// Batch window and size for each request's loaders
    pub loader_options: LoaderOptions,
    /// When a request reads whole tables up front
    pub preload: PreloadPolicy,
}

impl AppState {
    /// Build state from configuration and a connected store
    pub fn new(config: &Config, store: Arc<dyn Store>) -> Self {
        Self {
            schema: build_schema(config),
            store,
            loader_options: LoaderOptions::from_config(config),
            preload: PreloadPolicy::from_config(config),
        }
    }
}

/// Create the application router
///
/// Transport layers (trace, CORS) are added by the caller.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(graphql_router())
        // Nested health routes: /health, /health/live, /health/ready
        .nest("/health", health_router())
        .with_state(state)
}

async fn root() -> &'static str {
    "membergraph GraphQL gateway"
}
