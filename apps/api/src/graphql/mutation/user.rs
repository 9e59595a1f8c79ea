//! User mutations
//!
//! - createUser: Create a user
//! - changeUser: Update the supplied fields of a user
//! - deleteUser: Delete a user

use async_graphql::{Context, InputObject, Object, Result};
use uuid::Uuid;

use crate::error::{to_graphql_error, ApiError};
use crate::graphql::context::request;
use crate::graphql::types::User;
use crate::models::{ChangeUser, CreateUser};

// =============================================================================
// Input Types
// =============================================================================

/// Input for creating a user
#[derive(Debug, InputObject)]
pub struct CreateUserInput {
    pub name: String,
    pub balance: f64,
}

impl From<CreateUserInput> for CreateUser {
    fn from(input: CreateUserInput) -> Self {
        Self {
            name: input.name,
            balance: input.balance,
        }
    }
}

/// Input for updating a user; absent fields are left untouched
#[derive(Debug, InputObject)]
pub struct ChangeUserInput {
    pub name: Option<String>,
    pub balance: Option<f64>,
}

impl From<ChangeUserInput> for ChangeUser {
    fn from(input: ChangeUserInput) -> Self {
        Self {
            name: input.name,
            balance: input.balance,
        }
    }
}

// =============================================================================
// Mutations
// =============================================================================

/// User mutations
#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    /// Create a new user
    async fn create_user(&self, ctx: &Context<'_>, dto: CreateUserInput) -> Result<User> {
        let request = request(ctx)?;
        let user = request
            .store
            .create_user(dto.into())
            .await
            .map_err(to_graphql_error)?;

        request.loaders.prime_user(&user).await;
        tracing::info!(user_id = %user.id, "Created user");
        Ok(user.into())
    }

    /// Update a user
    async fn change_user(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        dto: ChangeUserInput,
    ) -> Result<User> {
        let request = request(ctx)?;
        let user = request
            .store
            .update_user(id, dto.into())
            .await
            .map_err(|e| to_graphql_error(ApiError::from_store(e, id.to_string())))?;

        request.loaders.prime_user(&user).await;
        Ok(user.into())
    }

    /// Delete a user
    ///
    /// The store removes the user's profile, posts and subscription edges with
    /// it, so every cached relation of this request is dropped.
    async fn delete_user(&self, ctx: &Context<'_>, id: Uuid) -> Result<String> {
        let request = request(ctx)?;
        request
            .store
            .delete_user(id)
            .await
            .map_err(|e| to_graphql_error(ApiError::from_store(e, id.to_string())))?;

        request.loaders.forget_users();
        request.loaders.forget_profiles();
        request.loaders.forget_posts();
        tracing::info!(user_id = %id, "Deleted user");
        Ok("User deleted successfully".to_string())
    }
}
