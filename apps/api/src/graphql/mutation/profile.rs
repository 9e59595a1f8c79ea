//! Profile mutations
//!
//! - createProfile: Create the profile of a user (one per user)
//! - changeProfile: Update the supplied fields of a profile
//! - deleteProfile: Delete a profile

use async_graphql::{Context, InputObject, Object, Result};
use uuid::Uuid;

use crate::error::{to_graphql_error, ApiError};
use crate::graphql::context::request;
use crate::graphql::types::{MemberTypeId, Profile};
use crate::models::{ChangeProfile, CreateProfile};

/// Input for creating a profile
#[derive(Debug, InputObject)]
pub struct CreateProfileInput {
    pub is_male: bool,
    pub year_of_birth: i32,
    pub user_id: Uuid,
    pub member_type_id: MemberTypeId,
}

impl From<CreateProfileInput> for CreateProfile {
    fn from(input: CreateProfileInput) -> Self {
        Self {
            is_male: input.is_male,
            year_of_birth: input.year_of_birth,
            user_id: input.user_id,
            member_type_id: input.member_type_id.into(),
        }
    }
}

/// Input for updating a profile; absent fields are left untouched
#[derive(Debug, InputObject)]
pub struct ChangeProfileInput {
    pub is_male: Option<bool>,
    pub year_of_birth: Option<i32>,
    pub member_type_id: Option<MemberTypeId>,
}

impl From<ChangeProfileInput> for ChangeProfile {
    fn from(input: ChangeProfileInput) -> Self {
        Self {
            is_male: input.is_male,
            year_of_birth: input.year_of_birth,
            member_type_id: input.member_type_id.map(Into::into),
        }
    }
}

/// Profile mutations
#[derive(Default)]
pub struct ProfileMutation;

#[Object]
impl ProfileMutation {
    /// Create a profile for an existing user
    ///
    /// # Errors
    /// - `CONFLICT` if the user already has a profile
    /// - `VALIDATION_ERROR` if the user or member type does not exist
    async fn create_profile(&self, ctx: &Context<'_>, dto: CreateProfileInput) -> Result<Profile> {
        let request = request(ctx)?;
        let profile = request
            .store
            .create_profile(dto.into())
            .await
            .map_err(to_graphql_error)?;

        request.loaders.prime_profile(&profile).await;
        tracing::info!(profile_id = %profile.id, user_id = %profile.user_id, "Created profile");
        Ok(profile.into())
    }

    /// Update a profile
    async fn change_profile(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        dto: ChangeProfileInput,
    ) -> Result<Profile> {
        let request = request(ctx)?;
        let profile = request
            .store
            .update_profile(id, dto.into())
            .await
            .map_err(|e| to_graphql_error(ApiError::from_store(e, id.to_string())))?;

        request.loaders.prime_profile(&profile).await;
        Ok(profile.into())
    }

    /// Delete a profile
    async fn delete_profile(&self, ctx: &Context<'_>, id: Uuid) -> Result<String> {
        let request = request(ctx)?;
        request
            .store
            .delete_profile(id)
            .await
            .map_err(|e| to_graphql_error(ApiError::from_store(e, id.to_string())))?;

        request.loaders.forget_profiles();
        Ok("Profile deleted successfully".to_string())
    }
}
