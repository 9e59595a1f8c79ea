//! GraphQL type definitions for membergraph
//!
//! This module contains the GraphQL object types exposed through the API.
//! Each wraps its database model and resolves relations through the
//! request's loaders.

mod member_type;
mod post;
mod profile;
mod subscription_edge;
mod user;

pub use member_type::{MemberType, MemberTypeId};
pub use post::Post;
pub use profile::Profile;
pub use subscription_edge::SubscriptionEdge;
pub use user::{include_for, User};
