//! Subscription edge queries

use async_graphql::{Context, Object, Result};

use super::root_list;
use crate::graphql::context::request;
use crate::graphql::types::SubscriptionEdge;

/// Queries over the subscription graph
#[derive(Default)]
pub struct SubscriptionQuery;

#[Object]
impl SubscriptionQuery {
    /// List every subscription edge
    async fn subscriptions(&self, ctx: &Context<'_>) -> Result<Vec<SubscriptionEdge>> {
        let rows = request(ctx)?.loaders.all_subscriptions().await;
        root_list(ctx, "subscriptions", rows)
    }
}
