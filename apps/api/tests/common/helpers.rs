//! Test helper functions for API integration tests
//!
//! Provides utility functions for executing GraphQL documents against a store
//! and asserting on responses.

#![allow(dead_code)]

use std::sync::Arc;

use async_graphql::{Request, Response};
use axum::{
    body::Body,
    http::{header, Request as HttpRequest, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use membergraph_api::config::Config;
use membergraph_api::graphql::{build_schema, LoaderOptions, MembergraphSchema, RequestContext};
use membergraph_api::{app_router, AppState, MemoryStore};

/// Execute a document with a fresh request context and no preload
pub async fn execute(store: &Arc<MemoryStore>, query: &str) -> Response {
    execute_on(&build_schema(&Config::default()), store, query).await
}

/// Execute a document against a specific schema
pub async fn execute_on(schema: &MembergraphSchema, store: &Arc<MemoryStore>, query: &str) -> Response {
    let context = RequestContext::new(store.clone(), LoaderOptions::default());
    schema.execute(Request::new(query).data(context)).await
}

/// Response data as JSON, asserting there were no errors
pub fn data(response: Response) -> Value {
    assert!(
        response.errors.is_empty(),
        "unexpected errors: {:?}",
        response.errors
    );
    response.data.into_json().unwrap()
}

/// `extensions.code` of the first error in the response
pub fn first_error_code(response: &Response) -> Option<String> {
    let error = response.errors.first()?;
    match error.extensions.as_ref()?.get("code")? {
        async_graphql::Value::String(code) => Some(code.clone()),
        _ => None,
    }
}

/// Full application router over `store` with default settings
pub fn app(store: &Arc<MemoryStore>) -> Router {
    app_router(AppState::new(&Config::default(), store.clone()))
}

/// POST a GraphQL document to `/graphql`
pub async fn post_graphql(app: Router, query: &str) -> (StatusCode, Value) {
    let body = serde_json::json!({ "query": query }).to_string();
    let response = app
        .oneshot(
            HttpRequest::builder()
                .method("POST")
                .uri("/graphql")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

/// Find the JSON object in `list` whose `id` is `id`
pub fn by_id<'a>(list: &'a Value, id: &str) -> &'a Value {
    list.as_array()
        .unwrap()
        .iter()
        .find(|item| item["id"] == id)
        .unwrap_or_else(|| panic!("no item with id {id} in {list}"))
}

/// Ids of the JSON objects in `list`
pub fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}
