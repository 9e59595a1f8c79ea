//! DataLoader implementations for GraphQL
//!
//! Every request gets its own [`Loaders`]: one batching cache per entity kind
//! plus a relationship loader for subscription edges. Lookups issued while a
//! batch window is open are collected into a single store call; resolved and
//! absent values stay cached for the rest of the request.
//!
//! There are two kinds of keys:
//! - Single-entity keys: `Uuid` / `MemberTypeId`, resolving to the entity
//! - Relationship keys: newtypes such as [`PostsByAuthor`] resolving to the
//!   related rows, cached even when empty
//!
//! Whole-table reads (`all_*`) are memoized in per-request [`OnceCell`]s and
//! prime the keyed caches. [`Loaders::preload_all`] fills every table and
//! cache up front, then flips the loaders into preloaded mode where batch
//! functions answer from the snapshots instead of the store.

mod member_type;
mod post;
mod profile;
mod subscription;
mod user;

pub use member_type::MemberTypeLoader;
pub use post::{PostLoader, PostsByAuthor};
pub use profile::{ProfileLoader, ProfileOfUser};
pub use subscription::{SubscribedTo, SubscribersOf, SubscriptionLoader};
pub use user::UserLoader;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_graphql::dataloader::{DataLoader, HashMapCache};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{
    MemberType, MemberTypeId, Post, Profile, ProfileRecord, SubscriptionEdge, User, UserInclude,
    UserRecord,
};
use crate::store::{group_edges, EdgeFilter, Filter, Store, StoreError};

/// A loader wrapped in a memoizing DataLoader
pub type Cached<T> = DataLoader<T, HashMapCache>;

/// Result of a loader call; one failed batch error is shared by every key
pub type LoadResult<T> = Result<T, Arc<StoreError>>;

/// Batch window and size limits applied to every loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    /// How long a batch stays open collecting keys
    pub delay: Duration,
    /// Keys per store call; larger batches are split
    pub max_batch_size: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1),
            max_batch_size: 1000,
        }
    }
}

impl LoaderOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            delay: config.loader_delay(),
            max_batch_size: config.loader_max_batch_size,
        }
    }

    fn build<T: Send + Sync + 'static>(&self, loader: T) -> Cached<T> {
        DataLoader::with_cache(loader, tokio::spawn, HashMapCache::default())
            .delay(self.delay)
            .max_batch_size(self.max_batch_size)
    }
}

/// Whole-table snapshots for one request
///
/// Each cell is filled at most once; concurrent readers of an empty cell
/// share the same store call.
#[derive(Default)]
pub(crate) struct Tables {
    preloaded: AtomicBool,
    preload: OnceCell<usize>,
    users: OnceCell<Arc<[User]>>,
    posts: OnceCell<Arc<[Post]>>,
    profiles: OnceCell<Arc<[Profile]>>,
    member_types: OnceCell<Arc<[MemberType]>>,
    subscriptions: OnceCell<Arc<[SubscriptionEdge]>>,
}

impl Tables {
    pub(crate) fn is_preloaded(&self) -> bool {
        self.preloaded.load(Ordering::Acquire)
    }

    fn snapshot<T>(&self, cell: &OnceCell<Arc<[T]>>) -> Option<Arc<[T]>> {
        if self.is_preloaded() {
            cell.get().cloned()
        } else {
            None
        }
    }

    /// Users table, once preloaded
    pub(crate) fn preloaded_users(&self) -> Option<Arc<[User]>> {
        self.snapshot(&self.users)
    }

    pub(crate) fn preloaded_posts(&self) -> Option<Arc<[Post]>> {
        self.snapshot(&self.posts)
    }

    pub(crate) fn preloaded_profiles(&self) -> Option<Arc<[Profile]>> {
        self.snapshot(&self.profiles)
    }

    pub(crate) fn preloaded_member_types(&self) -> Option<Arc<[MemberType]>> {
        self.snapshot(&self.member_types)
    }

    pub(crate) fn preloaded_subscriptions(&self) -> Option<Arc<[SubscriptionEdge]>> {
        self.snapshot(&self.subscriptions)
    }
}

/// Handles to the loaders that user and profile reads prime
#[derive(Clone)]
pub(crate) struct Siblings {
    pub profiles: Arc<Cached<ProfileLoader>>,
    pub posts: Arc<Cached<PostLoader>>,
    pub member_types: Arc<Cached<MemberTypeLoader>>,
    pub subscriptions: Arc<Cached<SubscriptionLoader>>,
}

impl Siblings {
    /// Feed every relation embedded in `records` into its loader
    ///
    /// Only relations the read included are fed, so an unrequested relation
    /// is never cached as empty.
    pub(crate) async fn prime_user_records(&self, records: &[UserRecord]) {
        let mut profile_of_user = Vec::new();
        let mut profile_records = Vec::new();
        let mut posts_by_author = Vec::new();
        let mut posts = Vec::new();
        let mut subscribed_to = Vec::new();
        let mut subscribers = Vec::new();

        for record in records {
            let id = record.user.id;
            if let Some(profile) = &record.profile {
                profile_of_user.push((ProfileOfUser(id), profile.as_ref().map(|r| r.profile.clone())));
                profile_records.extend(profile.iter().cloned());
            }
            if let Some(authored) = &record.posts {
                posts.extend(authored.iter().map(|p| (p.id, p.clone())));
                posts_by_author.push((PostsByAuthor(id), authored.clone()));
            }
            if let Some(ids) = &record.subscribed_to {
                subscribed_to.push((SubscribedTo(id), ids.clone()));
            }
            if let Some(ids) = &record.subscribers {
                subscribers.push((SubscribersOf(id), ids.clone()));
            }
        }

        self.profiles.feed_many(profile_of_user).await;
        self.prime_profile_records(&profile_records).await;
        self.posts.feed_many(posts_by_author).await;
        self.posts.feed_many(posts).await;
        self.subscriptions.feed_many(subscribed_to).await;
        self.subscriptions.feed_many(subscribers).await;
    }

    /// Feed profiles by id and their embedded member types
    pub(crate) async fn prime_profile_records(&self, records: &[ProfileRecord]) {
        self.profiles
            .feed_many(records.iter().map(|r| (r.profile.id, r.profile.clone())))
            .await;
        prime_member_types(&self.member_types, records).await;
    }
}

/// Feed the member types embedded in profile records
pub(crate) async fn prime_member_types(loader: &Cached<MemberTypeLoader>, records: &[ProfileRecord]) {
    let member_types: HashMap<MemberTypeId, MemberType> = records
        .iter()
        .filter_map(|r| r.member_type.clone())
        .map(|m| (m.id, m))
        .collect();
    loader.feed_many(member_types).await;
}

/// Per-request loader set
pub struct Loaders {
    store: Arc<dyn Store>,
    tables: Arc<Tables>,
    users: Cached<UserLoader>,
    siblings: Siblings,
}

impl Loaders {
    /// Build a fresh, empty loader set over `store`
    pub fn new(store: Arc<dyn Store>, options: LoaderOptions) -> Self {
        let tables = Arc::new(Tables::default());

        let member_types = Arc::new(options.build(MemberTypeLoader::new(
            store.clone(),
            tables.clone(),
        )));
        let profiles = Arc::new(options.build(ProfileLoader::new(
            store.clone(),
            tables.clone(),
            member_types.clone(),
        )));
        let posts = Arc::new(options.build(PostLoader::new(store.clone(), tables.clone())));
        let subscriptions = Arc::new(options.build(SubscriptionLoader::new(
            store.clone(),
            tables.clone(),
        )));

        let siblings = Siblings {
            profiles,
            posts,
            member_types,
            subscriptions,
        };
        let users = options.build(UserLoader::new(
            store.clone(),
            tables.clone(),
            siblings.clone(),
        ));

        Self {
            store,
            tables,
            users,
            siblings,
        }
    }

    /// Whether [`Loaders::preload_all`] has completed for this request
    pub fn is_preloaded(&self) -> bool {
        self.tables.is_preloaded()
    }

    // ==================== Keyed lookups ====================

    pub async fn user(&self, id: Uuid) -> LoadResult<Option<User>> {
        self.users.load_one(id).await
    }

    /// Users for `ids` in the given order; unknown ids are skipped
    pub async fn users(&self, ids: &[Uuid]) -> LoadResult<Vec<User>> {
        let found = self.users.load_many(ids.iter().copied()).await?;
        Ok(ids.iter().filter_map(|id| found.get(id).cloned()).collect())
    }

    /// Ask the next user batches to embed `include`
    ///
    /// Hints accumulate for the lifetime of the request and only widen what a
    /// batch fetches; they are never part of a cache key.
    pub fn hint_user_include(&self, include: UserInclude) {
        self.users.loader().hint(include);
    }

    pub async fn post(&self, id: Uuid) -> LoadResult<Option<Post>> {
        self.siblings.posts.load_one(id).await
    }

    pub async fn posts_by_author(&self, author_id: Uuid) -> LoadResult<Vec<Post>> {
        Ok(self
            .siblings
            .posts
            .load_one(PostsByAuthor(author_id))
            .await?
            .unwrap_or_default())
    }

    pub async fn profile(&self, id: Uuid) -> LoadResult<Option<Profile>> {
        self.siblings.profiles.load_one(id).await
    }

    pub async fn profile_of_user(&self, user_id: Uuid) -> LoadResult<Option<Profile>> {
        Ok(self
            .siblings
            .profiles
            .load_one(ProfileOfUser(user_id))
            .await?
            .flatten())
    }

    pub async fn member_type(&self, id: MemberTypeId) -> LoadResult<Option<MemberType>> {
        self.siblings.member_types.load_one(id).await
    }

    /// Ids of the authors `user_id` follows
    pub async fn subscribed_to(&self, user_id: Uuid) -> LoadResult<Vec<Uuid>> {
        Ok(self
            .siblings
            .subscriptions
            .load_one(SubscribedTo(user_id))
            .await?
            .unwrap_or_default())
    }

    /// Ids of the users following `author_id`
    pub async fn subscribers_of(&self, author_id: Uuid) -> LoadResult<Vec<Uuid>> {
        Ok(self
            .siblings
            .subscriptions
            .load_one(SubscribersOf(author_id))
            .await?
            .unwrap_or_default())
    }

    // ==================== Whole tables ====================

    /// Every user, embedding `include` on the first read of the request
    pub async fn all_users(&self, include: UserInclude) -> LoadResult<Arc<[User]>> {
        let users = self
            .tables
            .users
            .get_or_try_init(|| async {
                let records = self
                    .store
                    .find_users(Filter::All, include)
                    .await
                    .map_err(Arc::new)?;
                tracing::debug!(kind = "users", rows = records.len(), "Read whole table");

                self.siblings.prime_user_records(&records).await;
                let users: Arc<[User]> = records.into_iter().map(|r| r.user).collect();
                self.users
                    .feed_many(users.iter().map(|u| (u.id, u.clone())))
                    .await;
                Ok::<_, Arc<StoreError>>(users)
            })
            .await?;
        Ok(users.clone())
    }

    pub async fn all_posts(&self) -> LoadResult<Arc<[Post]>> {
        let posts = self
            .tables
            .posts
            .get_or_try_init(|| async {
                let posts: Arc<[Post]> = self
                    .store
                    .find_posts(Filter::All)
                    .await
                    .map_err(Arc::new)?
                    .into();
                tracing::debug!(kind = "posts", rows = posts.len(), "Read whole table");

                self.siblings
                    .posts
                    .feed_many(posts.iter().map(|p| (p.id, p.clone())))
                    .await;
                Ok::<_, Arc<StoreError>>(posts)
            })
            .await?;
        Ok(posts.clone())
    }

    pub async fn all_profiles(&self) -> LoadResult<Arc<[Profile]>> {
        let profiles = self
            .tables
            .profiles
            .get_or_try_init(|| async {
                let records = self
                    .store
                    .find_profiles(Filter::All)
                    .await
                    .map_err(Arc::new)?;
                tracing::debug!(kind = "profiles", rows = records.len(), "Read whole table");

                self.siblings.prime_profile_records(&records).await;
                self.siblings
                    .profiles
                    .feed_many(
                        records
                            .iter()
                            .map(|r| (ProfileOfUser(r.profile.user_id), Some(r.profile.clone()))),
                    )
                    .await;
                let profiles: Arc<[Profile]> = records.into_iter().map(|r| r.profile).collect();
                Ok::<_, Arc<StoreError>>(profiles)
            })
            .await?;
        Ok(profiles.clone())
    }

    pub async fn all_member_types(&self) -> LoadResult<Arc<[MemberType]>> {
        let member_types = self
            .tables
            .member_types
            .get_or_try_init(|| async {
                let member_types: Arc<[MemberType]> = self
                    .store
                    .find_member_types(None)
                    .await
                    .map_err(Arc::new)?
                    .into();
                tracing::debug!(kind = "member_types", rows = member_types.len(), "Read whole table");

                self.siblings
                    .member_types
                    .feed_many(member_types.iter().map(|m| (m.id, m.clone())))
                    .await;
                Ok::<_, Arc<StoreError>>(member_types)
            })
            .await?;
        Ok(member_types.clone())
    }

    /// Every subscription edge; primes both directions for each endpoint
    pub async fn all_subscriptions(&self) -> LoadResult<Arc<[SubscriptionEdge]>> {
        let edges = self
            .tables
            .subscriptions
            .get_or_try_init(|| async {
                let edges: Arc<[SubscriptionEdge]> = self
                    .store
                    .find_subscriptions(EdgeFilter::All)
                    .await
                    .map_err(Arc::new)?
                    .into();
                tracing::debug!(kind = "subscriptions", rows = edges.len(), "Read whole table");

                let (subscribed_to, subscribers) = group_edges(&edges);
                let mut endpoints: Vec<Uuid> = subscribed_to
                    .keys()
                    .chain(subscribers.keys())
                    .copied()
                    .collect();
                endpoints.sort_unstable();
                endpoints.dedup();
                self.prime_edges(&endpoints, subscribed_to, subscribers).await;
                Ok::<_, Arc<StoreError>>(edges)
            })
            .await?;
        Ok(edges.clone())
    }

    async fn prime_edges(
        &self,
        users: &[Uuid],
        mut subscribed_to: HashMap<Uuid, Vec<Uuid>>,
        mut subscribers: HashMap<Uuid, Vec<Uuid>>,
    ) {
        let loader = &self.siblings.subscriptions;
        loader
            .feed_many(users.iter().map(|id| {
                (SubscribedTo(*id), subscribed_to.remove(id).unwrap_or_default())
            }))
            .await;
        loader
            .feed_many(
                users
                    .iter()
                    .map(|id| (SubscribersOf(*id), subscribers.remove(id).unwrap_or_default())),
            )
            .await;
    }

    // ==================== Preload ====================

    /// Fill every table and cache for this request
    ///
    /// Issues three store calls: users with profile, member type and posts
    /// embedded; all subscription edges; all member types. Edges are
    /// distributed to both endpoints of every user. Running it again in the
    /// same request returns the first result without touching the store.
    pub async fn preload_all(&self) -> LoadResult<usize> {
        let count = self
            .tables
            .preload
            .get_or_try_init(|| self.run_preload())
            .await?;
        Ok(*count)
    }

    async fn run_preload(&self) -> LoadResult<usize> {
        let started = Instant::now();
        let include = UserInclude {
            profile: true,
            posts: true,
            subscriptions: false,
        };

        let (mut records, edges, member_types) = tokio::try_join!(
            self.store.find_users(Filter::All, include),
            self.store.find_subscriptions(EdgeFilter::All),
            self.store.find_member_types(None),
        )
        .map_err(Arc::new)?;

        let (mut subscribed_to, mut subscribers) = group_edges(&edges);
        for record in &mut records {
            let id = record.user.id;
            record.subscribed_to = Some(subscribed_to.remove(&id).unwrap_or_default());
            record.subscribers = Some(subscribers.remove(&id).unwrap_or_default());
        }

        self.siblings.prime_user_records(&records).await;
        self.siblings
            .member_types
            .feed_many(member_types.iter().map(|m| (m.id, m.clone())))
            .await;
        self.users
            .feed_many(records.iter().map(|r| (r.user.id, r.user.clone())))
            .await;

        let profiles: Arc<[Profile]> = records
            .iter()
            .filter_map(|r| r.profile.clone().flatten())
            .map(|r| r.profile)
            .collect();
        let posts: Arc<[Post]> = records
            .iter()
            .flat_map(|r| r.posts.iter().flatten().cloned())
            .collect();
        let users: Arc<[User]> = records.into_iter().map(|r| r.user).collect();
        let count = users.len();

        // A table read earlier in the request keeps its snapshot
        let _ = self.tables.users.set(users);
        let _ = self.tables.posts.set(posts);
        let _ = self.tables.profiles.set(profiles);
        let _ = self.tables.member_types.set(member_types.into());
        let _ = self.tables.subscriptions.set(edges.into());
        self.tables.preloaded.store(true, Ordering::Release);

        tracing::info!(
            users = count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Preloaded request data"
        );
        Ok(count)
    }

    // ==================== Writes ====================

    /// Replace the cached user after a write
    pub async fn prime_user(&self, user: &User) {
        self.users.feed_one(user.id, user.clone()).await;
    }

    /// Drop every cached user and relation after a user delete
    pub fn forget_users(&self) {
        self.users.clear::<Uuid>();
        self.siblings.profiles.clear::<ProfileOfUser>();
        self.siblings.posts.clear::<PostsByAuthor>();
        self.forget_subscriptions();
    }

    /// Replace the cached profile after a create or update
    pub async fn prime_profile(&self, profile: &Profile) {
        let profiles = &self.siblings.profiles;
        profiles.feed_one(profile.id, profile.clone()).await;
        profiles
            .feed_one(ProfileOfUser(profile.user_id), Some(profile.clone()))
            .await;
    }

    pub fn forget_profiles(&self) {
        self.siblings.profiles.clear::<Uuid>();
        self.siblings.profiles.clear::<ProfileOfUser>();
    }

    /// Replace the cached post and drop the author's cached post lists
    pub async fn prime_post(&self, post: &Post) {
        self.siblings.posts.feed_one(post.id, post.clone()).await;
        self.siblings.posts.clear::<PostsByAuthor>();
    }

    pub fn forget_posts(&self) {
        self.siblings.posts.clear::<Uuid>();
        self.siblings.posts.clear::<PostsByAuthor>();
    }

    pub fn forget_subscriptions(&self) {
        self.siblings.subscriptions.clear::<SubscribedTo>();
        self.siblings.subscriptions.clear::<SubscribersOf>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_default_options() {
        let options = LoaderOptions::default();
        assert_eq!(options.delay, Duration::from_millis(1));
        assert_eq!(options.max_batch_size, 1000);
    }

    #[tokio::test]
    async fn test_snapshots_hidden_until_preloaded() {
        let store = Arc::new(MemoryStore::new());
        let loaders = Loaders::new(store, LoaderOptions::default());

        loaders.all_member_types().await.unwrap();
        assert!(loaders.tables.member_types.get().is_some());
        assert!(loaders.tables.preloaded_member_types().is_none());

        loaders.preload_all().await.unwrap();
        assert!(loaders.is_preloaded());
        assert_eq!(loaders.tables.preloaded_member_types().map(|m| m.len()), Some(2));
    }
}
