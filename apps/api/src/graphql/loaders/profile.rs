//! Profile DataLoader for batched fetching
//!
//! Profiles come back from the store with their member type embedded; every
//! batch feeds those member types to the member type loader.

use async_graphql::dataloader::Loader;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use super::{prime_member_types, Cached, MemberTypeLoader, Tables};
use crate::models::{Profile, ProfileRecord};
use crate::store::{Filter, Store, StoreError};

/// Key for the profile owned by a user
///
/// Resolves to `None` when the user has no profile; that answer is cached
/// like any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProfileOfUser(pub Uuid);

/// DataLoader for batching profile queries
pub struct ProfileLoader {
    store: Arc<dyn Store>,
    tables: Arc<Tables>,
    member_types: Arc<Cached<MemberTypeLoader>>,
}

impl ProfileLoader {
    pub(crate) fn new(
        store: Arc<dyn Store>,
        tables: Arc<Tables>,
        member_types: Arc<Cached<MemberTypeLoader>>,
    ) -> Self {
        Self {
            store,
            tables,
            member_types,
        }
    }

    async fn fetch(&self, filter: Filter) -> Result<Vec<ProfileRecord>, Arc<StoreError>> {
        let records = self.store.find_profiles(filter).await.map_err(Arc::new)?;
        prime_member_types(&self.member_types, &records).await;
        Ok(records)
    }
}

impl Loader<Uuid> for ProfileLoader {
    type Value = Profile;
    type Error = Arc<StoreError>;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        if let Some(profiles) = self.tables.preloaded_profiles() {
            let wanted: HashSet<&Uuid> = keys.iter().collect();
            return Ok(profiles
                .iter()
                .filter(|p| wanted.contains(&p.id))
                .map(|p| (p.id, p.clone()))
                .collect());
        }

        tracing::debug!(kind = "profiles", keys = keys.len(), "Loading batch");
        let records = self.fetch(Filter::Ids(keys.to_vec())).await?;

        Ok(records
            .into_iter()
            .map(|r| (r.profile.id, r.profile))
            .collect())
    }
}

impl Loader<ProfileOfUser> for ProfileLoader {
    type Value = Option<Profile>;
    type Error = Arc<StoreError>;

    async fn load(
        &self,
        keys: &[ProfileOfUser],
    ) -> Result<HashMap<ProfileOfUser, Self::Value>, Self::Error> {
        let user_ids: Vec<Uuid> = keys.iter().map(|k| k.0).collect();

        let profiles: Vec<Profile> = match self.tables.preloaded_profiles() {
            Some(profiles) => {
                let wanted: HashSet<&Uuid> = user_ids.iter().collect();
                profiles
                    .iter()
                    .filter(|p| wanted.contains(&p.user_id))
                    .cloned()
                    .collect()
            }
            None => {
                tracing::debug!(kind = "profile_of_user", keys = keys.len(), "Loading batch");
                self.fetch(Filter::Owners(user_ids))
                    .await?
                    .into_iter()
                    .map(|r| r.profile)
                    .collect()
            }
        };

        let mut result: HashMap<ProfileOfUser, Option<Profile>> =
            keys.iter().map(|k| (*k, None)).collect();
        for profile in profiles {
            result.insert(ProfileOfUser(profile.user_id), Some(profile));
        }

        Ok(result)
    }
}
