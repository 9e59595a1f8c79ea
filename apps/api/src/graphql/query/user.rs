//! User queries

use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use super::root_list;
use crate::error::to_graphql_error;
use crate::graphql::context::request;
use crate::graphql::types::{include_for, User};

/// User-related queries
#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// List every user
    ///
    /// Relations selected below the list are embedded in the table read.
    async fn users(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        let loaders = &request(ctx)?.loaders;
        let include = include_for(ctx);
        loaders.hint_user_include(include);
        let rows = loaders.all_users(include).await;
        root_list(ctx, "users", rows)
    }

    /// Get a user by ID
    async fn user(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<User>> {
        let loaders = &request(ctx)?.loaders;
        loaders.hint_user_include(include_for(ctx));
        let user = loaders.user(id).await.map_err(to_graphql_error)?;
        Ok(user.map(User::from))
    }
}
