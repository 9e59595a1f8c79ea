//! GraphQL HTTP route handlers
//!
//! - `POST /graphql` - Execute a query or mutation
//! - `GET /graphql/playground` - GraphQL Playground

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_graphql::{Response, ServerError};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use futures_util::FutureExt;

use super::AppState;
use crate::error::{to_graphql_error, ApiError};
use crate::graphql::RequestContext;

/// Create the GraphQL router
pub fn graphql_router() -> Router<AppState> {
    Router::new()
        .route("/graphql", post(graphql_handler))
        .route("/graphql/playground", get(graphql_playground))
}

/// GraphQL handler that executes queries against the schema
///
/// Every request gets its own [`RequestContext`], so loader caches never
/// outlive the request. When the preload policy matches the document, whole
/// tables are read before execution; a failed preload is logged and the
/// request falls back to batched loading.
async fn graphql_handler(State(state): State<AppState>, req: GraphQLRequest) -> GraphQLResponse {
    let request = req.into_inner();
    let context = RequestContext::new(state.store.clone(), state.loader_options);

    if state
        .preload
        .should_preload(&request.query, request.operation_name.as_deref())
    {
        if let Err(e) = context.loaders.preload_all().await {
            tracing::warn!(error = %e, "Preload failed, continuing with batched loading");
        }
    }

    let request = request.data(context);
    execute(&state, request).await.into()
}

/// Run the request, turning a resolver panic into a top-level error
async fn execute(state: &AppState, request: async_graphql::Request) -> Response {
    AssertUnwindSafe(state.schema.execute(request))
        .catch_unwind()
        .await
        .unwrap_or_else(panic_response)
}

fn panic_response(panic: Box<dyn Any + Send>) -> Response {
    let reason = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    let error = to_graphql_error(ApiError::Internal(reason));
    let mut server_error = ServerError::new(error.message, None);
    server_error.extensions = error.extensions;
    Response::from_errors(vec![server_error])
}

/// GraphQL Playground handler for development
async fn graphql_playground() -> impl IntoResponse {
    Html(async_graphql::http::playground_source(
        async_graphql::http::GraphQLPlaygroundConfig::new("/graphql"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_becomes_internal_error() {
        let response = panic_response(Box::new("index out of bounds"));

        assert_eq!(response.errors.len(), 1);
        let error = &response.errors[0];
        assert!(!error.message.contains("index out of bounds"));
        let code = error
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from("INTERNAL_ERROR")));
    }

    #[test]
    fn test_panic_with_owned_message() {
        let response = panic_response(Box::new(String::from("boom")));
        assert_eq!(response.errors[0].message, "An unexpected error occurred");
    }
}
