//! Subscription graph mutations
//!
//! - subscribeTo: Make a user follow an author
//! - unsubscribeFrom: Remove a follow edge

use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use crate::error::{to_graphql_error, ApiError};
use crate::graphql::context::request;
use crate::store::StoreError;

/// Subscription mutations
#[derive(Default)]
pub struct SubscriptionMutation;

#[Object]
impl SubscriptionMutation {
    /// Subscribe `userId` to `authorId`
    ///
    /// A user may subscribe to themselves.
    ///
    /// # Errors
    /// - `ALREADY_SUBSCRIBED` if the edge exists
    /// - `VALIDATION_ERROR` if either user does not exist
    async fn subscribe_to(&self, ctx: &Context<'_>, user_id: Uuid, author_id: Uuid) -> Result<String> {
        let request = request(ctx)?;
        let already_subscribed = || {
            to_graphql_error(ApiError::AlreadySubscribed {
                subscriber_id: user_id,
                author_id,
            })
        };

        let existing = request
            .store
            .find_subscription(user_id, author_id)
            .await
            .map_err(to_graphql_error)?;
        if existing.is_some() {
            return Err(already_subscribed());
        }

        // A concurrent request may insert the edge between the check and the write
        match request.store.create_subscription(user_id, author_id).await {
            Ok(_) => {}
            Err(StoreError::UniqueViolation { .. }) => return Err(already_subscribed()),
            Err(err) => return Err(to_graphql_error(err)),
        }

        request.loaders.forget_subscriptions();
        tracing::info!(subscriber_id = %user_id, author_id = %author_id, "Subscribed");
        Ok("Subscribed successfully".to_string())
    }

    /// Remove the `userId` -> `authorId` edge
    ///
    /// # Errors
    /// - `NOT_FOUND` if the edge does not exist
    async fn unsubscribe_from(
        &self,
        ctx: &Context<'_>,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<String> {
        let request = request(ctx)?;
        request
            .store
            .delete_subscription(user_id, author_id)
            .await
            .map_err(|e| {
                to_graphql_error(ApiError::from_store(e, format!("{user_id} -> {author_id}")))
            })?;

        request.loaders.forget_subscriptions();
        tracing::info!(subscriber_id = %user_id, author_id = %author_id, "Unsubscribed");
        Ok("Unsubscribed successfully".to_string())
    }
}
