//! Subscription edge DataLoader
//!
//! Relationship loader over the subscribers_on_authors edge table. It
//! answers with counterpart user ids only; callers project them to users
//! through the user loader, so nested traversal never materializes more than
//! one level of the graph at a time.

use async_graphql::dataloader::Loader;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use super::Tables;
use crate::models::SubscriptionEdge;
use crate::store::{EdgeFilter, Store, StoreError};

/// Key for the authors a user follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscribedTo(pub Uuid);

/// Key for the users following an author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscribersOf(pub Uuid);

/// DataLoader for batching subscription edge queries
pub struct SubscriptionLoader {
    store: Arc<dyn Store>,
    tables: Arc<Tables>,
}

impl SubscriptionLoader {
    pub(crate) fn new(store: Arc<dyn Store>, tables: Arc<Tables>) -> Self {
        Self { store, tables }
    }

    async fn edges(&self, filter: EdgeFilter) -> Result<Vec<SubscriptionEdge>, Arc<StoreError>> {
        if let Some(edges) = self.tables.preloaded_subscriptions() {
            let wanted: HashSet<&Uuid> = match &filter {
                EdgeFilter::All => HashSet::new(),
                EdgeFilter::Subscribers(ids) | EdgeFilter::Authors(ids) => ids.iter().collect(),
            };
            return Ok(edges
                .iter()
                .filter(|e| match &filter {
                    EdgeFilter::All => true,
                    EdgeFilter::Subscribers(_) => wanted.contains(&e.subscriber_id),
                    EdgeFilter::Authors(_) => wanted.contains(&e.author_id),
                })
                .cloned()
                .collect());
        }
        self.store.find_subscriptions(filter).await.map_err(Arc::new)
    }
}

/// Group counterpart ids under their key, giving every key an entry
fn group<K: Copy + Eq + std::hash::Hash>(
    keys: &[K],
    pairs: impl Iterator<Item = (K, Uuid)>,
) -> HashMap<K, Vec<Uuid>> {
    let mut result: HashMap<K, Vec<Uuid>> = keys.iter().map(|k| (*k, Vec::new())).collect();
    for (key, id) in pairs {
        result.entry(key).or_default().push(id);
    }
    result
}

impl Loader<SubscribedTo> for SubscriptionLoader {
    type Value = Vec<Uuid>;
    type Error = Arc<StoreError>;

    async fn load(
        &self,
        keys: &[SubscribedTo],
    ) -> Result<HashMap<SubscribedTo, Self::Value>, Self::Error> {
        tracing::debug!(kind = "subscribed_to", keys = keys.len(), "Loading batch");
        let ids = keys.iter().map(|k| k.0).collect();
        let edges = self.edges(EdgeFilter::Subscribers(ids)).await?;

        Ok(group(
            keys,
            edges
                .into_iter()
                .map(|e| (SubscribedTo(e.subscriber_id), e.author_id)),
        ))
    }
}

impl Loader<SubscribersOf> for SubscriptionLoader {
    type Value = Vec<Uuid>;
    type Error = Arc<StoreError>;

    async fn load(
        &self,
        keys: &[SubscribersOf],
    ) -> Result<HashMap<SubscribersOf, Self::Value>, Self::Error> {
        tracing::debug!(kind = "subscribers_of", keys = keys.len(), "Loading batch");
        let ids = keys.iter().map(|k| k.0).collect();
        let edges = self.edges(EdgeFilter::Authors(ids)).await?;

        Ok(group(
            keys,
            edges
                .into_iter()
                .map(|e| (SubscribersOf(e.author_id), e.subscriber_id)),
        ))
    }
}
