//! Post GraphQL type

use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use crate::error::to_graphql_error;
use crate::graphql::context::request;
use crate::models::Post as DbPost;

use super::user::{include_for, User};

/// Post exposed via GraphQL
pub struct Post {
    inner: DbPost,
}

impl Post {
    pub fn new(post: DbPost) -> Self {
        Self { inner: post }
    }
}

impl From<DbPost> for Post {
    fn from(post: DbPost) -> Self {
        Self::new(post)
    }
}

#[Object]
impl Post {
    async fn id(&self) -> Uuid {
        self.inner.id
    }

    async fn title(&self) -> &str {
        &self.inner.title
    }

    async fn content(&self) -> &str {
        &self.inner.content
    }

    async fn author_id(&self) -> Uuid {
        self.inner.author_id
    }

    /// Author of the post (uses DataLoader for batched fetching)
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let loaders = &request(ctx)?.loaders;
        loaders.hint_user_include(include_for(ctx));
        let user = loaders
            .user(self.inner.author_id)
            .await
            .map_err(to_graphql_error)?;
        Ok(user.map(User::from))
    }
}
