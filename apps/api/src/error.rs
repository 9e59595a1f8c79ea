//! Error handling for the membergraph API
//!
//! This module provides a unified error type using thiserror. Each variant
//! carries an HTTP status, used for log severity, and a stable code exposed
//! to GraphQL clients as `extensions.code`.

use std::sync::Arc;

use async_graphql::ErrorExtensions;
use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Main API error type
#[derive(Error, Debug)]
pub enum ApiError {
    // ========== Resource Errors ==========
    /// Requested resource not found
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// The subscriber already follows the author
    #[error("user {subscriber_id} is already subscribed to {author_id}")]
    AlreadySubscribed { subscriber_id: Uuid, author_id: Uuid },

    /// Resource already exists (conflict)
    #[error("{resource_type} already exists: {id}")]
    Conflict {
        resource_type: &'static str,
        id: String,
    },

    // ========== Validation Errors ==========
    /// Input was rejected, e.g. a reference to a missing row
    #[error("validation error: {0}")]
    ValidationError(String),

    // ========== Store Errors ==========
    /// Store could not serve a read or write
    #[error("store error: {0}")]
    Store(String),

    /// Database query failed
    #[error("database error: {0}")]
    Database(String),

    // ========== Internal Errors ==========
    /// Internal server error (catch-all for unexpected errors)
    #[error("internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 404 Not Found
            Self::NotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadySubscribed { .. } | Self::Conflict { .. } => StatusCode::CONFLICT,

            // 400 Bad Request
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,

            // 503 Service Unavailable
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for client-side handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadySubscribed { .. } => "ALREADY_SUBSCRIBED",
            Self::Conflict { .. } => "CONFLICT",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::Store(_) => "STORE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Create a not found error for a specific resource
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// Create a conflict error for a specific resource
    pub fn conflict(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::Conflict {
            resource_type,
            id: id.into(),
        }
    }

    /// Log the error with appropriate severity based on status code
    pub fn log(&self) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Client error"
            );
        }
    }

    /// Map a store failure for a keyed write, naming the resource and key
    pub fn from_store(err: StoreError, id: impl Into<String>) -> Self {
        match err {
            StoreError::NotFound { entity } => Self::not_found(entity, id),
            other => other.into(),
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        // Server-side failures keep their detail in the logs only
        let message = if self.status_code().is_server_error() {
            match self {
                Self::Store(_) => "The data store is unavailable".to_string(),
                _ => "An unexpected error occurred".to_string(),
            }
        } else {
            self.to_string()
        };

        let code = self.error_code();
        async_graphql::Error::new(message).extend_with(|_, e| e.set("code", code))
    }
}

/// Convert API errors to GraphQL errors, logging them on the way out
pub fn to_graphql_error(error: impl Into<ApiError>) -> async_graphql::Error {
    let error = error.into();
    error.log();
    error.extend()
}

// ========== Conversion Implementations ==========

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::from(&err)
    }
}

impl From<&StoreError> for ApiError {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::NotFound { entity } => Self::not_found(*entity, "unknown"),
            StoreError::UniqueViolation { entity, detail } => Self::conflict(*entity, detail.clone()),
            StoreError::ForeignKeyViolation { .. } => Self::ValidationError(err.to_string()),
            StoreError::Database(db) => Self::Database(db.to_string()),
            StoreError::Unavailable(reason) => Self::Store(reason.clone()),
        }
    }
}

/// Loader batches share one error between every waiting key
impl From<Arc<StoreError>> for ApiError {
    fn from(err: Arc<StoreError>) -> Self {
        Self::from(err.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::not_found("user", "123").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::ValidationError("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::AlreadySubscribed {
                subscriber_id: Uuid::nil(),
                author_id: Uuid::nil(),
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Store("down".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_store_error_mapping() {
        let conflict: ApiError = StoreError::UniqueViolation {
            entity: "profile",
            detail: "user 1".to_string(),
        }
        .into();
        assert_eq!(conflict.error_code(), "CONFLICT");

        let fk: ApiError = StoreError::ForeignKeyViolation {
            entity: "post",
            target: "user",
        }
        .into();
        assert_matches!(fk, ApiError::ValidationError(_));

        let shared = Arc::new(StoreError::Unavailable("timeout".to_string()));
        assert_eq!(ApiError::from(shared).error_code(), "STORE_ERROR");
    }

    #[test]
    fn test_from_store_names_the_key() {
        let err = ApiError::from_store(StoreError::not_found("post"), "abc");
        assert_eq!(err.to_string(), "post not found: abc");
    }

    #[test]
    fn test_graphql_extension_code() {
        let err = ApiError::not_found("subscription", "a -> b").extend();
        let code = err
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from("NOT_FOUND")));
        assert_eq!(err.message, "subscription not found: a -> b");
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err = ApiError::Database("connection reset by peer".to_string()).extend();
        assert!(!err.message.contains("connection reset"));
    }
}
