//! Test fixtures for API integration tests
//!
//! Seeds a [`MemoryStore`] with a small social graph:
//! - alice: BASIC profile, two posts, follows bob
//! - bob: BUSINESS profile, one post, follows alice
//! - carol: no profile, no posts, follows alice

#![allow(dead_code)]

use std::sync::Arc;

use membergraph_api::models::{
    CreatePost, CreateProfile, CreateUser, MemberTypeId, Post, Profile, User,
};
use membergraph_api::{MemoryStore, Store};

/// Rows created by [`seeded_store`]
#[derive(Debug, Clone)]
pub struct Seed {
    pub alice: User,
    pub bob: User,
    pub carol: User,
    pub alice_profile: Profile,
    pub bob_profile: Profile,
    pub alice_posts: Vec<Post>,
    pub bob_posts: Vec<Post>,
}

async fn user(store: &MemoryStore, name: &str, balance: f64) -> User {
    store
        .create_user(CreateUser {
            name: name.to_string(),
            balance,
        })
        .await
        .unwrap()
}

async fn profile(store: &MemoryStore, user: &User, member_type_id: MemberTypeId) -> Profile {
    store
        .create_profile(CreateProfile {
            is_male: false,
            year_of_birth: 1990,
            user_id: user.id,
            member_type_id,
        })
        .await
        .unwrap()
}

async fn post(store: &MemoryStore, author: &User, title: &str) -> Post {
    store
        .create_post(CreatePost {
            title: title.to_string(),
            content: format!("{title} body"),
            author_id: author.id,
        })
        .await
        .unwrap()
}

/// Store with the fixture graph; statistics are reset after seeding
pub async fn seeded_store() -> (Arc<MemoryStore>, Seed) {
    let store = MemoryStore::new();

    let alice = user(&store, "alice", 120.5).await;
    let bob = user(&store, "bob", 80.0).await;
    let carol = user(&store, "carol", 0.0).await;

    let alice_profile = profile(&store, &alice, MemberTypeId::Basic).await;
    let bob_profile = profile(&store, &bob, MemberTypeId::Business).await;

    let alice_posts = vec![
        post(&store, &alice, "first").await,
        post(&store, &alice, "second").await,
    ];
    let bob_posts = vec![post(&store, &bob, "hello").await];

    store.create_subscription(alice.id, bob.id).await.unwrap();
    store.create_subscription(bob.id, alice.id).await.unwrap();
    store.create_subscription(carol.id, alice.id).await.unwrap();

    store.stats().reset();

    let seed = Seed {
        alice,
        bob,
        carol,
        alice_profile,
        bob_profile,
        alice_posts,
        bob_posts,
    };
    (Arc::new(store), seed)
}
