//! Store adapter
//!
//! The gateway never talks to a database directly: resolvers and loaders go
//! through the [`Store`] trait, which offers filtered bulk reads with
//! optional relation embedding, single-key reads, and keyed writes for each
//! entity kind.
//!
//! Two implementations ship with the crate:
//! - [`PgStore`]: PostgreSQL through sqlx
//! - [`MemoryStore`]: in-process tables with read counters, used for local
//!   development and by the test suite

mod columns;
pub mod memory;
pub mod postgres;

pub use memory::{MemoryStore, StoreStats};
pub use postgres::PgStore;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ChangePost, ChangeProfile, ChangeUser, CreatePost, CreateProfile, CreateUser, MemberType,
    MemberTypeId, Post, Profile, ProfileRecord, SubscriptionEdge, User, UserInclude, UserRecord,
};

/// Errors raised by a store implementation
#[derive(Error, Debug)]
pub enum StoreError {
    /// Keyed write or delete targeted a row that does not exist
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// A unique constraint rejected the write
    #[error("{entity} already exists: {detail}")]
    UniqueViolation { entity: &'static str, detail: String },

    /// A foreign key referenced a missing row
    #[error("{entity} references a missing {target}")]
    ForeignKeyViolation {
        entity: &'static str,
        target: &'static str,
    },

    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store could not serve the request
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Row filter for bulk reads of users, profiles and posts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Every row of the table
    All,
    /// Rows whose primary key is in the set
    Ids(Vec<Uuid>),
    /// Rows whose owning user is in the set (`profiles.user_id`,
    /// `posts.author_id`); users have no owner and match nothing
    Owners(Vec<Uuid>),
}

/// Filter for bulk reads of subscription edges
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeFilter {
    All,
    /// Edges whose subscriber is in the set
    Subscribers(Vec<Uuid>),
    /// Edges whose author is in the set
    Authors(Vec<Uuid>),
}

/// Index edges by subscriber (authors followed) and by author (followers)
pub(crate) fn group_edges(
    edges: &[SubscriptionEdge],
) -> (HashMap<Uuid, Vec<Uuid>>, HashMap<Uuid, Vec<Uuid>>) {
    let mut subscribed_to: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    let mut subscribers: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for edge in edges {
        subscribed_to
            .entry(edge.subscriber_id)
            .or_default()
            .push(edge.author_id);
        subscribers
            .entry(edge.author_id)
            .or_default()
            .push(edge.subscriber_id);
    }
    (subscribed_to, subscribers)
}

/// Attach fetched relation rows to their users
///
/// Only relations named in `include` are set on the records; for those, a
/// user without rows gets an explicit empty answer. An edge is recorded on
/// both endpoints when both are among `users`.
pub(crate) fn assemble_user_records(
    users: Vec<User>,
    include: UserInclude,
    profiles: Vec<ProfileRecord>,
    posts: Vec<Post>,
    edges: Vec<SubscriptionEdge>,
) -> Vec<UserRecord> {
    let mut profiles_by_user: HashMap<Uuid, ProfileRecord> = profiles
        .into_iter()
        .map(|record| (record.profile.user_id, record))
        .collect();

    let mut posts_by_author: HashMap<Uuid, Vec<Post>> = HashMap::new();
    for post in posts {
        posts_by_author.entry(post.author_id).or_default().push(post);
    }

    let (mut subscribed_to, mut subscribers) = group_edges(&edges);

    users
        .into_iter()
        .map(|user| {
            let id = user.id;
            let mut record = UserRecord::bare(user);
            if include.profile {
                record.profile = Some(profiles_by_user.remove(&id));
            }
            if include.posts {
                record.posts = Some(posts_by_author.remove(&id).unwrap_or_default());
            }
            if include.subscriptions {
                record.subscribed_to = Some(subscribed_to.remove(&id).unwrap_or_default());
                record.subscribers = Some(subscribers.remove(&id).unwrap_or_default());
            }
            record
        })
        .collect()
}

/// Data access interface consumed by the gateway
///
/// Implementations serialize their own writes; callers share one instance
/// across requests without further locking.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    // ==================== Users ====================

    /// Bulk read users, embedding the relations named in `include`
    async fn find_users(&self, filter: Filter, include: UserInclude)
        -> StoreResult<Vec<UserRecord>>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn update_user(&self, id: Uuid, data: ChangeUser) -> StoreResult<User>;

    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;

    // ==================== Profiles ====================

    /// Bulk read profiles with their member type embedded
    async fn find_profiles(&self, filter: Filter) -> StoreResult<Vec<ProfileRecord>>;

    async fn find_profile(&self, id: Uuid) -> StoreResult<Option<Profile>>;

    async fn create_profile(&self, data: CreateProfile) -> StoreResult<Profile>;

    async fn update_profile(&self, id: Uuid, data: ChangeProfile) -> StoreResult<Profile>;

    async fn delete_profile(&self, id: Uuid) -> StoreResult<()>;

    // ==================== Posts ====================

    async fn find_posts(&self, filter: Filter) -> StoreResult<Vec<Post>>;

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>>;

    async fn create_post(&self, data: CreatePost) -> StoreResult<Post>;

    async fn update_post(&self, id: Uuid, data: ChangePost) -> StoreResult<Post>;

    async fn delete_post(&self, id: Uuid) -> StoreResult<()>;

    // ==================== Member types ====================

    /// Bulk read member types; `None` reads the whole catalogue
    async fn find_member_types(&self, ids: Option<Vec<MemberTypeId>>)
        -> StoreResult<Vec<MemberType>>;

    async fn find_member_type(&self, id: MemberTypeId) -> StoreResult<Option<MemberType>>;

    // ==================== Subscriptions ====================

    async fn find_subscriptions(&self, filter: EdgeFilter) -> StoreResult<Vec<SubscriptionEdge>>;

    async fn find_subscription(
        &self,
        subscriber_id: Uuid,
        author_id: Uuid,
    ) -> StoreResult<Option<SubscriptionEdge>>;

    /// Create an edge; an existing pair fails with [`StoreError::UniqueViolation`]
    async fn create_subscription(
        &self,
        subscriber_id: Uuid,
        author_id: Uuid,
    ) -> StoreResult<SubscriptionEdge>;

    /// Delete an edge; a missing pair fails with [`StoreError::NotFound`]
    async fn delete_subscription(&self, subscriber_id: Uuid, author_id: Uuid)
        -> StoreResult<()>;

    /// Connectivity check for readiness probes
    async fn ping(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::UniqueViolation {
            entity: "subscription",
            detail: "a -> b".to_string(),
        };
        assert_eq!(err.to_string(), "subscription already exists: a -> b");
        assert!(err.is_unique_violation());
        assert!(!StoreError::not_found("user").is_unique_violation());
    }

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            balance: 0.0,
        }
    }

    #[test]
    fn test_assemble_distributes_edges_both_ways() {
        let a = user("a");
        let b = user("b");
        let edge = SubscriptionEdge {
            subscriber_id: a.id,
            author_id: b.id,
            created_at: chrono::Utc::now(),
        };
        let include = UserInclude {
            subscriptions: true,
            ..UserInclude::default()
        };

        let records = assemble_user_records(
            vec![a.clone(), b.clone()],
            include,
            Vec::new(),
            Vec::new(),
            vec![edge],
        );

        assert_eq!(records[0].subscribed_to, Some(vec![b.id]));
        assert_eq!(records[0].subscribers, Some(vec![]));
        assert_eq!(records[1].subscribers, Some(vec![a.id]));
        // relations that were not requested stay unset
        assert!(records[0].posts.is_none());
        assert!(records[0].profile.is_none());
    }

    #[test]
    fn test_assemble_marks_missing_profile_and_posts() {
        let a = user("a");
        let include = UserInclude {
            profile: true,
            posts: true,
            subscriptions: false,
        };

        let records = assemble_user_records(vec![a], include, Vec::new(), Vec::new(), Vec::new());

        assert_eq!(records[0].profile, Some(None));
        assert_eq!(records[0].posts, Some(vec![]));
        assert!(records[0].subscribed_to.is_none());
    }
}
