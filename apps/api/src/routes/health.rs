//! Health check HTTP route handlers
//!
//! Provides endpoints for checking the health of the API and its store:
//! - `GET /health` - Simple liveness check (returns 200 OK)
//! - `GET /health/ready` - Readiness check (pings the store)
//! - `GET /health/live` - Kubernetes-style liveness probe

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use super::AppState;

/// Readiness probe body
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// "ready" or "unavailable"
    pub status: &'static str,
    /// Store ping time in milliseconds
    pub response_time_ms: u64,
    /// Error message if the store is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// API version
    pub version: &'static str,
}

/// Create health check router
pub fn health_router() -> Router<AppState> {
    Router::new()
        .route("/", get(simple_health))
        .route("/live", get(liveness_probe))
        .route("/ready", get(readiness_probe))
}

/// Simple health check - always returns OK if the server is running
async fn simple_health() -> &'static str {
    "OK"
}

/// Liveness probe for Kubernetes
///
/// This should NOT check the store - that's what readiness is for.
async fn liveness_probe() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness probe - pings the store
///
/// # Response
/// - 200 OK if the store answers
/// - 503 Service Unavailable otherwise
async fn readiness_probe(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let result = state.store.ping().await;
    let response_time_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                response_time_ms,
                error: None,
                version: env!("CARGO_PKG_VERSION"),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "unavailable",
                    response_time_ms,
                    error: Some(e.to_string()),
                    version: env!("CARGO_PKG_VERSION"),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health() {
        let response = simple_health().await;
        assert_eq!(response, "OK");
    }

    #[tokio::test]
    async fn test_liveness_probe() {
        let response = liveness_probe().await;
        let json = response.into_response();
        assert_eq!(json.status(), StatusCode::OK);
    }
}
