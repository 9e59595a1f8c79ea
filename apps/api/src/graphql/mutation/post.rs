//! Post mutations
//!
//! - createPost: Publish a post for an author
//! - changePost: Update the supplied fields of a post
//! - deletePost: Delete a post

use async_graphql::{Context, InputObject, Object, Result};
use uuid::Uuid;

use crate::error::{to_graphql_error, ApiError};
use crate::graphql::context::request;
use crate::graphql::types::Post;
use crate::models::{ChangePost, CreatePost};

/// Input for creating a post
#[derive(Debug, InputObject)]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
}

impl From<CreatePostInput> for CreatePost {
    fn from(input: CreatePostInput) -> Self {
        Self {
            title: input.title,
            content: input.content,
            author_id: input.author_id,
        }
    }
}

/// Input for updating a post; absent fields are left untouched
#[derive(Debug, InputObject)]
pub struct ChangePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl From<ChangePostInput> for ChangePost {
    fn from(input: ChangePostInput) -> Self {
        Self {
            title: input.title,
            content: input.content,
        }
    }
}

/// Post mutations
#[derive(Default)]
pub struct PostMutation;

#[Object]
impl PostMutation {
    /// Create a post
    async fn create_post(&self, ctx: &Context<'_>, dto: CreatePostInput) -> Result<Post> {
        let request = request(ctx)?;
        let post = request
            .store
            .create_post(dto.into())
            .await
            .map_err(to_graphql_error)?;

        request.loaders.prime_post(&post).await;
        tracing::info!(post_id = %post.id, author_id = %post.author_id, "Created post");
        Ok(post.into())
    }

    /// Update a post
    async fn change_post(&self, ctx: &Context<'_>, id: Uuid, dto: ChangePostInput) -> Result<Post> {
        let request = request(ctx)?;
        let post = request
            .store
            .update_post(id, dto.into())
            .await
            .map_err(|e| to_graphql_error(ApiError::from_store(e, id.to_string())))?;

        request.loaders.prime_post(&post).await;
        Ok(post.into())
    }

    /// Delete a post
    async fn delete_post(&self, ctx: &Context<'_>, id: Uuid) -> Result<String> {
        let request = request(ctx)?;
        request
            .store
            .delete_post(id)
            .await
            .map_err(|e| to_graphql_error(ApiError::from_store(e, id.to_string())))?;

        request.loaders.forget_posts();
        Ok("Post deleted successfully".to_string())
    }
}
