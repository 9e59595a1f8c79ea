//! In-process store
//!
//! Keeps every table in memory behind a `tokio::sync::RwLock` and mirrors
//! the PostgreSQL store's constraint behaviour (unique profile per user,
//! unique subscription pair, foreign keys, cascading deletes). Each adapter
//! call bumps a per-entity read counter so callers can assert how many store
//! round trips a request needed.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{assemble_user_records, EdgeFilter, Filter, Store, StoreError, StoreResult};
use crate::models::{
    ChangePost, ChangeProfile, ChangeUser, CreatePost, CreateProfile, CreateUser, MemberType,
    MemberTypeId, Post, Profile, ProfileRecord, SubscriptionEdge, User, UserInclude, UserRecord,
};

/// Adapter call counters, one per entity kind
#[derive(Debug, Default)]
pub struct StoreStats {
    user_reads: AtomicUsize,
    profile_reads: AtomicUsize,
    post_reads: AtomicUsize,
    member_type_reads: AtomicUsize,
    subscription_reads: AtomicUsize,
    writes: AtomicUsize,
}

impl StoreStats {
    pub fn user_reads(&self) -> usize {
        self.user_reads.load(Ordering::SeqCst)
    }

    pub fn profile_reads(&self) -> usize {
        self.profile_reads.load(Ordering::SeqCst)
    }

    pub fn post_reads(&self) -> usize {
        self.post_reads.load(Ordering::SeqCst)
    }

    pub fn member_type_reads(&self) -> usize {
        self.member_type_reads.load(Ordering::SeqCst)
    }

    pub fn subscription_reads(&self) -> usize {
        self.subscription_reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Read calls across every entity kind
    pub fn total_reads(&self) -> usize {
        self.user_reads()
            + self.profile_reads()
            + self.post_reads()
            + self.member_type_reads()
            + self.subscription_reads()
    }

    /// Zero every counter
    pub fn reset(&self) {
        for counter in [
            &self.user_reads,
            &self.profile_reads,
            &self.post_reads,
            &self.member_type_reads,
            &self.subscription_reads,
            &self.writes,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
    }
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    profiles: Vec<Profile>,
    posts: Vec<Post>,
    member_types: Vec<MemberType>,
    edges: Vec<SubscriptionEdge>,
}

impl Tables {
    fn has_user(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn has_member_type(&self, id: MemberTypeId) -> bool {
        self.member_types.iter().any(|m| m.id == id)
    }

    fn profile_record(&self, profile: &Profile) -> ProfileRecord {
        let member_type = profile
            .member_type_id
            .and_then(|id| self.member_types.iter().find(|m| m.id == id).cloned());
        ProfileRecord {
            profile: profile.clone(),
            member_type,
        }
    }

    fn filter_profiles(&self, filter: &Filter) -> Vec<ProfileRecord> {
        self.profiles
            .iter()
            .filter(|p| match filter {
                Filter::All => true,
                Filter::Ids(ids) => ids.contains(&p.id),
                Filter::Owners(ids) => ids.contains(&p.user_id),
            })
            .map(|p| self.profile_record(p))
            .collect()
    }

    fn filter_posts(&self, filter: &Filter) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|p| match filter {
                Filter::All => true,
                Filter::Ids(ids) => ids.contains(&p.id),
                Filter::Owners(ids) => ids.contains(&p.author_id),
            })
            .cloned()
            .collect()
    }
}

/// Store that keeps all rows in process memory
pub struct MemoryStore {
    tables: RwLock<Tables>,
    stats: StoreStats,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store seeded with the member type catalogue
    pub fn new() -> Self {
        let tables = Tables {
            member_types: MemberTypeId::ALL
                .into_iter()
                .map(MemberType::seeded)
                .collect(),
            ..Tables::default()
        };
        Self {
            tables: RwLock::new(tables),
            stats: StoreStats::default(),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Call counters for this store
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Make every subsequent read fail with [`StoreError::Unavailable`]
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn read(&self, counter: &AtomicUsize) -> StoreResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        Ok(())
    }

    fn write(&self) {
        self.stats.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_users(
        &self,
        filter: Filter,
        include: UserInclude,
    ) -> StoreResult<Vec<UserRecord>> {
        self.read(&self.stats.user_reads)?;
        let tables = self.tables.read().await;

        let users: Vec<User> = tables
            .users
            .iter()
            .filter(|u| match &filter {
                Filter::All => true,
                Filter::Ids(ids) => ids.contains(&u.id),
                Filter::Owners(_) => false,
            })
            .cloned()
            .collect();
        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();

        let profiles = if include.profile {
            tables.filter_profiles(&Filter::Owners(ids.clone()))
        } else {
            Vec::new()
        };
        let posts = if include.posts {
            tables.filter_posts(&Filter::Owners(ids.clone()))
        } else {
            Vec::new()
        };
        let edges = if include.subscriptions {
            tables
                .edges
                .iter()
                .filter(|e| ids.contains(&e.subscriber_id) || ids.contains(&e.author_id))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        Ok(assemble_user_records(users, include, profiles, posts, edges))
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.read(&self.stats.user_reads)?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        self.write();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            balance: data.balance,
        };
        self.tables.write().await.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, data: ChangeUser) -> StoreResult<User> {
        self.write();
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StoreError::not_found("user"))?;
        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(balance) = data.balance {
            user.balance = balance;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.write();
        let mut tables = self.tables.write().await;
        if !tables.has_user(id) {
            return Err(StoreError::not_found("user"));
        }
        tables.users.retain(|u| u.id != id);
        tables.profiles.retain(|p| p.user_id != id);
        tables.posts.retain(|p| p.author_id != id);
        tables
            .edges
            .retain(|e| e.subscriber_id != id && e.author_id != id);
        Ok(())
    }

    async fn find_profiles(&self, filter: Filter) -> StoreResult<Vec<ProfileRecord>> {
        self.read(&self.stats.profile_reads)?;
        let tables = self.tables.read().await;
        Ok(tables.filter_profiles(&filter))
    }

    async fn find_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        self.read(&self.stats.profile_reads)?;
        let tables = self.tables.read().await;
        Ok(tables.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn create_profile(&self, data: CreateProfile) -> StoreResult<Profile> {
        self.write();
        let mut tables = self.tables.write().await;
        if !tables.has_user(data.user_id) {
            return Err(StoreError::ForeignKeyViolation {
                entity: "profile",
                target: "user",
            });
        }
        if !tables.has_member_type(data.member_type_id) {
            return Err(StoreError::ForeignKeyViolation {
                entity: "profile",
                target: "member type",
            });
        }
        if tables.profiles.iter().any(|p| p.user_id == data.user_id) {
            return Err(StoreError::UniqueViolation {
                entity: "profile",
                detail: format!("user {} already has a profile", data.user_id),
            });
        }
        let profile = Profile {
            id: Uuid::new_v4(),
            is_male: data.is_male,
            year_of_birth: data.year_of_birth,
            user_id: data.user_id,
            member_type_id: Some(data.member_type_id),
        };
        tables.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update_profile(&self, id: Uuid, data: ChangeProfile) -> StoreResult<Profile> {
        self.write();
        let mut tables = self.tables.write().await;
        if let Some(member_type_id) = data.member_type_id {
            if !tables.has_member_type(member_type_id) {
                return Err(StoreError::ForeignKeyViolation {
                    entity: "profile",
                    target: "member type",
                });
            }
        }
        let profile = tables
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found("profile"))?;
        if let Some(is_male) = data.is_male {
            profile.is_male = is_male;
        }
        if let Some(year_of_birth) = data.year_of_birth {
            profile.year_of_birth = year_of_birth;
        }
        if let Some(member_type_id) = data.member_type_id {
            profile.member_type_id = Some(member_type_id);
        }
        Ok(profile.clone())
    }

    async fn delete_profile(&self, id: Uuid) -> StoreResult<()> {
        self.write();
        let mut tables = self.tables.write().await;
        let before = tables.profiles.len();
        tables.profiles.retain(|p| p.id != id);
        if tables.profiles.len() == before {
            return Err(StoreError::not_found("profile"));
        }
        Ok(())
    }

    async fn find_posts(&self, filter: Filter) -> StoreResult<Vec<Post>> {
        self.read(&self.stats.post_reads)?;
        let tables = self.tables.read().await;
        Ok(tables.filter_posts(&filter))
    }

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        self.read(&self.stats.post_reads)?;
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create_post(&self, data: CreatePost) -> StoreResult<Post> {
        self.write();
        let mut tables = self.tables.write().await;
        if !tables.has_user(data.author_id) {
            return Err(StoreError::ForeignKeyViolation {
                entity: "post",
                target: "user",
            });
        }
        let post = Post {
            id: Uuid::new_v4(),
            title: data.title,
            content: data.content,
            author_id: data.author_id,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: Uuid, data: ChangePost) -> StoreResult<Post> {
        self.write();
        let mut tables = self.tables.write().await;
        let post = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found("post"))?;
        if let Some(title) = data.title {
            post.title = title;
        }
        if let Some(content) = data.content {
            post.content = content;
        }
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<()> {
        self.write();
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Err(StoreError::not_found("post"));
        }
        Ok(())
    }

    async fn find_member_types(
        &self,
        ids: Option<Vec<MemberTypeId>>,
    ) -> StoreResult<Vec<MemberType>> {
        self.read(&self.stats.member_type_reads)?;
        let tables = self.tables.read().await;
        Ok(tables
            .member_types
            .iter()
            .filter(|m| ids.as_ref().map_or(true, |ids| ids.contains(&m.id)))
            .cloned()
            .collect())
    }

    async fn find_member_type(&self, id: MemberTypeId) -> StoreResult<Option<MemberType>> {
        self.read(&self.stats.member_type_reads)?;
        let tables = self.tables.read().await;
        Ok(tables.member_types.iter().find(|m| m.id == id).cloned())
    }

    async fn find_subscriptions(&self, filter: EdgeFilter) -> StoreResult<Vec<SubscriptionEdge>> {
        self.read(&self.stats.subscription_reads)?;
        let tables = self.tables.read().await;
        Ok(tables
            .edges
            .iter()
            .filter(|e| match &filter {
                EdgeFilter::All => true,
                EdgeFilter::Subscribers(ids) => ids.contains(&e.subscriber_id),
                EdgeFilter::Authors(ids) => ids.contains(&e.author_id),
            })
            .cloned()
            .collect())
    }

    async fn find_subscription(
        &self,
        subscriber_id: Uuid,
        author_id: Uuid,
    ) -> StoreResult<Option<SubscriptionEdge>> {
        self.read(&self.stats.subscription_reads)?;
        let tables = self.tables.read().await;
        Ok(tables
            .edges
            .iter()
            .find(|e| e.key() == (subscriber_id, author_id))
            .cloned())
    }

    async fn create_subscription(
        &self,
        subscriber_id: Uuid,
        author_id: Uuid,
    ) -> StoreResult<SubscriptionEdge> {
        self.write();
        let mut tables = self.tables.write().await;
        if !tables.has_user(subscriber_id) || !tables.has_user(author_id) {
            return Err(StoreError::ForeignKeyViolation {
                entity: "subscription",
                target: "user",
            });
        }
        if tables
            .edges
            .iter()
            .any(|e| e.key() == (subscriber_id, author_id))
        {
            return Err(StoreError::UniqueViolation {
                entity: "subscription",
                detail: format!("{} -> {}", subscriber_id, author_id),
            });
        }
        let edge = SubscriptionEdge {
            subscriber_id,
            author_id,
            created_at: Utc::now(),
        };
        tables.edges.push(edge.clone());
        Ok(edge)
    }

    async fn delete_subscription(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()> {
        self.write();
        let mut tables = self.tables.write().await;
        let before = tables.edges.len();
        tables
            .edges
            .retain(|e| e.key() != (subscriber_id, author_id));
        if tables.edges.len() == before {
            return Err(StoreError::not_found("subscription"));
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    async fn user(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(CreateUser {
                name: name.to_string(),
                balance: 10.0,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_seeded_member_types() {
        let store = MemoryStore::new();
        let all = store.find_member_types(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(store.stats().member_type_reads(), 1);
    }

    #[tokio::test]
    async fn test_find_unique_by_key() {
        let store = MemoryStore::new();
        let a = user(&store, "a").await;
        let profile = store
            .create_profile(CreateProfile {
                is_male: true,
                year_of_birth: 1990,
                user_id: a.id,
                member_type_id: MemberTypeId::Basic,
            })
            .await
            .unwrap();
        let post = store
            .create_post(CreatePost {
                title: "t".to_string(),
                content: "c".to_string(),
                author_id: a.id,
            })
            .await
            .unwrap();

        assert_eq!(store.find_user(a.id).await.unwrap(), Some(a.clone()));
        assert_eq!(store.find_profile(profile.id).await.unwrap(), Some(profile));
        assert_eq!(store.find_post(post.id).await.unwrap(), Some(post));
        assert_eq!(
            store
                .find_member_type(MemberTypeId::Business)
                .await
                .unwrap()
                .map(|m| m.id),
            Some(MemberTypeId::Business)
        );
        assert_eq!(store.find_user(Uuid::new_v4()).await.unwrap(), None);
        assert_eq!(store.find_post(Uuid::new_v4()).await.unwrap(), None);

        let stats = store.stats();
        assert_eq!(stats.user_reads(), 2);
        assert_eq!(stats.profile_reads(), 1);
        assert_eq!(stats.post_reads(), 2);
        assert_eq!(stats.member_type_reads(), 1);
    }

    #[tokio::test]
    async fn test_profile_is_unique_per_user() {
        let store = MemoryStore::new();
        let ada = user(&store, "Ada").await;
        let input = CreateProfile {
            is_male: false,
            year_of_birth: 1815,
            user_id: ada.id,
            member_type_id: MemberTypeId::Basic,
        };

        store.create_profile(input.clone()).await.unwrap();
        let err = store.create_profile(input).await.unwrap_err();
        assert_matches!(err, StoreError::UniqueViolation { entity: "profile", .. });
    }

    #[tokio::test]
    async fn test_duplicate_subscription_rejected() {
        let store = MemoryStore::new();
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;

        store.create_subscription(a.id, b.id).await.unwrap();
        let err = store.create_subscription(a.id, b.id).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_delete_missing_subscription_is_not_found() {
        let store = MemoryStore::new();
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;

        let err = store.delete_subscription(a.id, b.id).await.unwrap_err();
        assert_matches!(err, StoreError::NotFound { entity: "subscription" });
    }

    #[tokio::test]
    async fn test_partial_update_keeps_untouched_fields() {
        let store = MemoryStore::new();
        let a = user(&store, "before").await;

        let updated = store
            .update_user(
                a.id,
                ChangeUser {
                    name: Some("after".to_string()),
                    balance: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "after");
        assert_eq!(updated.balance, 10.0);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = MemoryStore::new();
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;
        store
            .create_post(CreatePost {
                title: "t".to_string(),
                content: "c".to_string(),
                author_id: a.id,
            })
            .await
            .unwrap();
        store.create_subscription(b.id, a.id).await.unwrap();

        store.delete_user(a.id).await.unwrap();

        assert!(store.find_posts(Filter::All).await.unwrap().is_empty());
        assert!(store
            .find_subscriptions(EdgeFilter::All)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_still_counts_call() {
        let store = MemoryStore::new();
        store.set_fail_reads(true);

        let err = store
            .find_users(Filter::All, UserInclude::default())
            .await
            .unwrap_err();

        assert_matches!(err, StoreError::Unavailable(_));
        assert_eq!(store.stats().user_reads(), 1);
    }

    #[tokio::test]
    async fn test_find_users_embeds_requested_relations() {
        let store = MemoryStore::new();
        let a = user(&store, "a").await;
        store
            .create_profile(CreateProfile {
                is_male: true,
                year_of_birth: 1990,
                user_id: a.id,
                member_type_id: MemberTypeId::Business,
            })
            .await
            .unwrap();

        let records = store
            .find_users(Filter::Ids(vec![a.id]), UserInclude::all())
            .await
            .unwrap();

        let profile = records[0].profile.clone().flatten().expect("profile embedded");
        assert_eq!(
            profile.member_type.map(|m| m.id),
            Some(MemberTypeId::Business)
        );
        assert_eq!(records[0].posts, Some(vec![]));
        assert_eq!(store.stats().user_reads(), 1);
        assert_eq!(store.stats().profile_reads(), 0);
    }
}
