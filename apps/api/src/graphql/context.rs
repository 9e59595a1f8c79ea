//! Per-request resolution context
//!
//! A [`RequestContext`] is built by the HTTP handler for every incoming
//! GraphQL request and attached with `Request::data`. It is never placed in
//! the schema, so caches cannot leak between requests.

use std::sync::Arc;

use async_graphql::{Context, Result};

use super::loaders::{LoaderOptions, Loaders};
use crate::store::Store;

/// Store adapter plus the request's loader set
pub struct RequestContext {
    pub store: Arc<dyn Store>,
    pub loaders: Loaders,
}

impl RequestContext {
    /// Fresh context with empty caches
    pub fn new(store: Arc<dyn Store>, options: LoaderOptions) -> Self {
        Self {
            loaders: Loaders::new(store.clone(), options),
            store,
        }
    }
}

/// Fetch the request context from a resolver's [`Context`]
pub fn request<'a>(ctx: &Context<'a>) -> Result<&'a RequestContext> {
    ctx.data::<RequestContext>()
}
