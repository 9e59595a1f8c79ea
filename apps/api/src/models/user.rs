//! User model
//!
//! A user owns at most one profile, any number of posts, and takes part in
//! subscription edges as subscriber and as author.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Post, ProfileRecord};

/// User record from the users table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Account balance
    pub balance: f64,
}

/// User creation input
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub balance: f64,
}

/// Partial user update; `None` fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeUser {
    pub name: Option<String>,
    pub balance: Option<f64>,
}

/// Which relations a bulk user read should embed
///
/// Loaders OR these together from resolver look-ahead, so a batch fetches
/// the union of what any waiting field needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserInclude {
    /// Profile together with its member type
    pub profile: bool,
    /// Authored posts
    pub posts: bool,
    /// Outgoing and incoming subscription edges
    pub subscriptions: bool,
}

impl UserInclude {
    const PROFILE: u8 = 0b001;
    const POSTS: u8 = 0b010;
    const SUBSCRIPTIONS: u8 = 0b100;

    /// Every relation
    pub fn all() -> Self {
        Self {
            profile: true,
            posts: true,
            subscriptions: true,
        }
    }

    /// Whether nothing beyond the user row is requested
    pub fn is_empty(&self) -> bool {
        !(self.profile || self.posts || self.subscriptions)
    }

    /// Pack into a bit set for atomic storage
    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.profile {
            bits |= Self::PROFILE;
        }
        if self.posts {
            bits |= Self::POSTS;
        }
        if self.subscriptions {
            bits |= Self::SUBSCRIPTIONS;
        }
        bits
    }

    /// Unpack from a bit set produced by [`UserInclude::bits`]
    pub fn from_bits(bits: u8) -> Self {
        Self {
            profile: bits & Self::PROFILE != 0,
            posts: bits & Self::POSTS != 0,
            subscriptions: bits & Self::SUBSCRIPTIONS != 0,
        }
    }
}

/// A user row with whichever relations the read asked to embed
///
/// `None` means the relation was not requested, as opposed to an empty
/// answer (`Some(None)` for a missing profile, `Some(vec![])` for no posts).
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub profile: Option<Option<ProfileRecord>>,
    pub posts: Option<Vec<Post>>,
    /// Ids of the authors this user subscribes to
    pub subscribed_to: Option<Vec<Uuid>>,
    /// Ids of the users subscribed to this user
    pub subscribers: Option<Vec<Uuid>>,
}

impl UserRecord {
    /// A record with no embedded relations
    pub fn bare(user: User) -> Self {
        Self {
            user,
            profile: None,
            posts: None,
            subscribed_to: None,
            subscribers: None,
        }
    }
}
