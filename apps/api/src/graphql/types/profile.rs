//! Profile GraphQL type

use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use crate::error::to_graphql_error;
use crate::graphql::context::request;
use crate::models::Profile as DbProfile;

use super::member_type::{MemberType, MemberTypeId};
use super::user::User;

/// User profile exposed via GraphQL
pub struct Profile {
    inner: DbProfile,
}

impl Profile {
    pub fn new(profile: DbProfile) -> Self {
        Self { inner: profile }
    }
}

impl From<DbProfile> for Profile {
    fn from(profile: DbProfile) -> Self {
        Self::new(profile)
    }
}

#[Object]
impl Profile {
    async fn id(&self) -> Uuid {
        self.inner.id
    }

    async fn is_male(&self) -> bool {
        self.inner.is_male
    }

    async fn year_of_birth(&self) -> i32 {
        self.inner.year_of_birth
    }

    /// Owning user ID
    async fn user_id(&self) -> Uuid {
        self.inner.user_id
    }

    async fn member_type_id(&self) -> Option<MemberTypeId> {
        self.inner.member_type_id.map(MemberTypeId::from)
    }

    // Relationship resolvers

    /// Membership tier; null without a store call when the profile has none
    async fn member_type(&self, ctx: &Context<'_>) -> Result<Option<MemberType>> {
        let Some(id) = self.inner.member_type_id else {
            return Ok(None);
        };
        let member_type = request(ctx)?
            .loaders
            .member_type(id)
            .await
            .map_err(to_graphql_error)?;
        Ok(member_type.map(MemberType::from))
    }

    /// Owning user (uses DataLoader for batched fetching)
    async fn user(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let loaders = &request(ctx)?.loaders;
        loaders.hint_user_include(super::user::include_for(ctx));
        let user = loaders
            .user(self.inner.user_id)
            .await
            .map_err(to_graphql_error)?;
        Ok(user.map(User::from))
    }
}
