//! Profile queries

use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use super::root_list;
use crate::error::to_graphql_error;
use crate::graphql::context::request;
use crate::graphql::types::Profile;

/// Profile-related queries
#[derive(Default)]
pub struct ProfileQuery;

#[Object]
impl ProfileQuery {
    /// List every profile
    async fn profiles(&self, ctx: &Context<'_>) -> Result<Vec<Profile>> {
        let rows = request(ctx)?.loaders.all_profiles().await;
        root_list(ctx, "profiles", rows)
    }

    /// Get a profile by ID
    async fn profile(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<Profile>> {
        let profile = request(ctx)?
            .loaders
            .profile(id)
            .await
            .map_err(to_graphql_error)?;
        Ok(profile.map(Profile::from))
    }
}
