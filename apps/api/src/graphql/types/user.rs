//! User GraphQL type
//!
//! Every relation resolves through the request's loaders. Before loading
//! users, resolvers register which relations the selection below them needs
//! ([`include_for`]) so the user batch can embed them in the same store call.

use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use crate::error::to_graphql_error;
use crate::graphql::context::request;
use crate::models::{User as DbUser, UserInclude};

use super::post::Post;
use super::profile::Profile;

/// Relations a user selection reaches into
///
/// `ctx` must be the context of a field whose selection set is a `User`.
pub fn include_for(ctx: &Context<'_>) -> UserInclude {
    let selection = ctx.look_ahead();
    UserInclude {
        profile: selection.field("profile").exists(),
        posts: selection.field("posts").exists(),
        subscriptions: selection.field("userSubscribedTo").exists()
            || selection.field("subscribedToUser").exists(),
    }
}

/// User exposed via GraphQL
pub struct User {
    inner: DbUser,
}

impl User {
    pub fn new(user: DbUser) -> Self {
        Self { inner: user }
    }
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self::new(user)
    }
}

/// Project counterpart ids onto users, keeping edge order
async fn project(ctx: &Context<'_>, ids: &[Uuid]) -> Result<Vec<User>> {
    let loaders = &request(ctx)?.loaders;
    loaders.hint_user_include(include_for(ctx));
    let users = loaders.users(ids).await.map_err(to_graphql_error)?;
    Ok(users.into_iter().map(User::from).collect())
}

#[Object]
impl User {
    async fn id(&self) -> Uuid {
        self.inner.id
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn balance(&self) -> f64 {
        self.inner.balance
    }

    // Relationship resolvers

    /// Profile of this user (uses DataLoader for batched fetching)
    async fn profile(&self, ctx: &Context<'_>) -> Result<Option<Profile>> {
        let profile = request(ctx)?
            .loaders
            .profile_of_user(self.inner.id)
            .await
            .map_err(to_graphql_error)?;
        Ok(profile.map(Profile::from))
    }

    /// Posts written by this user (uses DataLoader for batched fetching)
    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<Post>> {
        let posts = request(ctx)?
            .loaders
            .posts_by_author(self.inner.id)
            .await
            .map_err(to_graphql_error)?;
        Ok(posts.into_iter().map(Post::from).collect())
    }

    /// Authors this user is subscribed to
    async fn user_subscribed_to(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        let ids = request(ctx)?
            .loaders
            .subscribed_to(self.inner.id)
            .await
            .map_err(to_graphql_error)?;
        project(ctx, &ids).await
    }

    /// Users subscribed to this user
    async fn subscribed_to_user(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        let ids = request(ctx)?
            .loaders
            .subscribers_of(self.inner.id)
            .await
            .map_err(to_graphql_error)?;
        project(ctx, &ids).await
    }
}
