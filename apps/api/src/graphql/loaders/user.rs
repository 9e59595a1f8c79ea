//! User DataLoader for batched fetching
//!
//! This loader batches user ID lookups into a single store read. The
//! relations embedded in that read follow the include hints resolvers have
//! registered so far, and every embedded row is fed to its sibling loader.

use async_graphql::dataloader::Loader;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use super::{Siblings, Tables};
use crate::models::{User, UserInclude};
use crate::store::{Filter, Store, StoreError};

/// DataLoader for batching user queries
pub struct UserLoader {
    store: Arc<dyn Store>,
    tables: Arc<Tables>,
    siblings: Siblings,
    include: AtomicU8,
}

impl UserLoader {
    pub(crate) fn new(store: Arc<dyn Store>, tables: Arc<Tables>, siblings: Siblings) -> Self {
        Self {
            store,
            tables,
            siblings,
            include: AtomicU8::new(0),
        }
    }

    /// Widen the relations embedded by later batches
    pub fn hint(&self, include: UserInclude) {
        self.include.fetch_or(include.bits(), Ordering::AcqRel);
    }

    /// Relations the next batch will embed
    pub fn include(&self) -> UserInclude {
        UserInclude::from_bits(self.include.load(Ordering::Acquire))
    }
}

impl Loader<Uuid> for UserLoader {
    type Value = User;
    type Error = Arc<StoreError>;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        if let Some(users) = self.tables.preloaded_users() {
            let wanted: HashSet<&Uuid> = keys.iter().collect();
            return Ok(users
                .iter()
                .filter(|u| wanted.contains(&u.id))
                .map(|u| (u.id, u.clone()))
                .collect());
        }

        let include = self.include();
        tracing::debug!(kind = "users", keys = keys.len(), ?include, "Loading batch");

        let records = self
            .store
            .find_users(Filter::Ids(keys.to_vec()), include)
            .await
            .map_err(Arc::new)?;

        self.siblings.prime_user_records(&records).await;

        Ok(records
            .into_iter()
            .map(|r| (r.user.id, r.user))
            .collect())
    }
}
