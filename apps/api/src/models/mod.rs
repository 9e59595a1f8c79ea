//! Database models for membergraph
//!
//! This module contains SQLx models for:
//! - Users and their profiles
//! - Posts
//! - The fixed member type catalogue
//! - Subscription edges between users

pub mod member_type;
pub mod post;
pub mod profile;
pub mod subscription;
pub mod user;

pub use member_type::{MemberType, MemberTypeId};
pub use post::{ChangePost, CreatePost, Post};
pub use profile::{ChangeProfile, CreateProfile, Profile, ProfileRecord};
pub use subscription::SubscriptionEdge;
pub use user::{ChangeUser, CreateUser, User, UserInclude, UserRecord};
