//! membergraph API library
//!
//! This module exposes the core API components for use in integration tests
//! and as a library.

pub mod config;
pub mod error;
pub mod graphql;
pub mod models;
pub mod routes;
pub mod store;

// Re-export commonly used types
pub use error::ApiError;
pub use routes::{app_router, AppState};
pub use store::{MemoryStore, PgStore, Store, StoreError};
