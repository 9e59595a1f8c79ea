//! Member type DataLoader for batched fetching

use async_graphql::dataloader::Loader;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::Tables;
use crate::models::{MemberType, MemberTypeId};
use crate::store::{Store, StoreError};

/// DataLoader for batching member type queries
pub struct MemberTypeLoader {
    store: Arc<dyn Store>,
    tables: Arc<Tables>,
}

impl MemberTypeLoader {
    pub(crate) fn new(store: Arc<dyn Store>, tables: Arc<Tables>) -> Self {
        Self { store, tables }
    }
}

impl Loader<MemberTypeId> for MemberTypeLoader {
    type Value = MemberType;
    type Error = Arc<StoreError>;

    async fn load(
        &self,
        keys: &[MemberTypeId],
    ) -> Result<HashMap<MemberTypeId, Self::Value>, Self::Error> {
        let member_types: Vec<MemberType> = match self.tables.preloaded_member_types() {
            Some(all) => {
                let wanted: HashSet<&MemberTypeId> = keys.iter().collect();
                all.iter().filter(|m| wanted.contains(&m.id)).cloned().collect()
            }
            None => {
                tracing::debug!(kind = "member_types", keys = keys.len(), "Loading batch");
                self.store
                    .find_member_types(Some(keys.to_vec()))
                    .await
                    .map_err(Arc::new)?
            }
        };

        Ok(member_types.into_iter().map(|m| (m.id, m)).collect())
    }
}
