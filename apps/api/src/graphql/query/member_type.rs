//! Member type queries

use async_graphql::{Context, Object, Result};

use super::root_list;
use crate::error::to_graphql_error;
use crate::graphql::context::request;
use crate::graphql::types::{MemberType, MemberTypeId};

/// Queries over the member type catalogue
#[derive(Default)]
pub struct MemberTypeQuery;

#[Object]
impl MemberTypeQuery {
    /// List every member type
    async fn member_types(&self, ctx: &Context<'_>) -> Result<Vec<MemberType>> {
        let rows = request(ctx)?.loaders.all_member_types().await;
        root_list(ctx, "memberTypes", rows)
    }

    /// Get a member type by ID
    async fn member_type(&self, ctx: &Context<'_>, id: MemberTypeId) -> Result<Option<MemberType>> {
        let member_type = request(ctx)?
            .loaders
            .member_type(id.into())
            .await
            .map_err(to_graphql_error)?;
        Ok(member_type.map(MemberType::from))
    }
}
