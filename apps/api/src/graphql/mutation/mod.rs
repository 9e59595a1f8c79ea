//! GraphQL mutations for membergraph
//!
//! This module contains all mutation resolvers, organized by domain. Writes go
//! straight to the store; the request's caches are primed with the written
//! row or cleared for the relations a write can change.

mod post;
mod profile;
mod subscription;
mod user;

pub use post::{ChangePostInput, CreatePostInput, PostMutation};
pub use profile::{ChangeProfileInput, CreateProfileInput, ProfileMutation};
pub use subscription::SubscriptionMutation;
pub use user::{ChangeUserInput, CreateUserInput, UserMutation};

use async_graphql::MergedObject;

/// Root mutation type combining all mutation domains
#[derive(MergedObject, Default)]
#[graphql(name = "Mutations")]
pub struct Mutation(UserMutation, ProfileMutation, PostMutation, SubscriptionMutation);
