//! Post queries

use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use super::root_list;
use crate::error::to_graphql_error;
use crate::graphql::context::request;
use crate::graphql::types::Post;

/// Post-related queries
#[derive(Default)]
pub struct PostQuery;

#[Object]
impl PostQuery {
    /// List every post
    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<Post>> {
        let rows = request(ctx)?.loaders.all_posts().await;
        root_list(ctx, "posts", rows)
    }

    /// Get a post by ID
    async fn post(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<Post>> {
        let post = request(ctx)?
            .loaders
            .post(id)
            .await
            .map_err(to_graphql_error)?;
        Ok(post.map(Post::from))
    }
}
