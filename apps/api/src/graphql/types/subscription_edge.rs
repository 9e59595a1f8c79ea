//! Subscription edge GraphQL type

use async_graphql::{Context, Object, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::to_graphql_error;
use crate::graphql::context::request;
use crate::models::SubscriptionEdge as DbSubscriptionEdge;

use super::user::{include_for, User};

/// "Subscriber follows author" edge exposed via GraphQL
pub struct SubscriptionEdge {
    inner: DbSubscriptionEdge,
}

impl SubscriptionEdge {
    pub fn new(edge: DbSubscriptionEdge) -> Self {
        Self { inner: edge }
    }

    async fn endpoint(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<User>> {
        let loaders = &request(ctx)?.loaders;
        loaders.hint_user_include(include_for(ctx));
        let user = loaders.user(id).await.map_err(to_graphql_error)?;
        Ok(user.map(User::from))
    }
}

impl From<DbSubscriptionEdge> for SubscriptionEdge {
    fn from(edge: DbSubscriptionEdge) -> Self {
        Self::new(edge)
    }
}

#[Object]
impl SubscriptionEdge {
    async fn subscriber_id(&self) -> Uuid {
        self.inner.subscriber_id
    }

    async fn author_id(&self) -> Uuid {
        self.inner.author_id
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Following user
    async fn subscriber(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        self.endpoint(ctx, self.inner.subscriber_id).await
    }

    /// Followed user
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        self.endpoint(ctx, self.inner.author_id).await
    }
}
