//! Integration tests for GraphQL query and mutation resolvers
//!
//! Documents run against a seeded in-memory store with a fresh request
//! context each, without preload.

mod common;

use async_graphql::Request;
use rstest::rstest;
use serde_json::json;
use uuid::Uuid;

use common::*;
use membergraph_api::config::{Config, ListFieldFallback};
use membergraph_api::graphql::{build_schema, LoaderOptions, RequestContext, SchemaBuilder};

// ==================== Queries ====================

#[tokio::test]
async fn test_users_with_relations_need_one_store_call() {
    let (store, seed) = seeded_store().await;

    let response = execute(
        &store,
        "{ users { id posts { id } profile { memberType { id } } } }",
    )
    .await;
    let data = data(response);

    let alice = by_id(&data["users"], &seed.alice.id.to_string());
    assert_eq!(alice["posts"].as_array().unwrap().len(), 2);
    assert_eq!(alice["profile"]["memberType"]["id"], "BASIC");

    let bob = by_id(&data["users"], &seed.bob.id.to_string());
    assert_eq!(bob["profile"]["memberType"]["id"], "BUSINESS");

    let carol = by_id(&data["users"], &seed.carol.id.to_string());
    assert!(carol["profile"].is_null());
    assert_eq!(carol["posts"], json!([]));

    assert_eq!(store.stats().user_reads(), 1);
    assert_eq!(store.stats().total_reads(), 1);
}

#[tokio::test]
async fn test_nested_subscription_lists_are_populated() {
    let (store, seed) = seeded_store().await;

    let response = execute(
        &store,
        "{ users { id userSubscribedTo { id subscribedToUser { id } } } }",
    )
    .await;
    let data = data(response);

    let carol = by_id(&data["users"], &seed.carol.id.to_string());
    let follows = &carol["userSubscribedTo"];
    assert_eq!(ids(follows), vec![seed.alice.id.to_string()]);

    let mut alice_followers = ids(&follows[0]["subscribedToUser"]);
    alice_followers.sort();
    let mut expected = vec![seed.bob.id.to_string(), seed.carol.id.to_string()];
    expected.sort();
    assert_eq!(alice_followers, expected);

    assert_eq!(store.stats().total_reads(), 1);
}

#[rstest]
#[case("BASIC", 2.3, 20)]
#[case("BUSINESS", 7.7, 100)]
#[tokio::test]
async fn test_member_type_by_id(#[case] id: &str, #[case] discount: f64, #[case] limit: i64) {
    let (store, _seed) = seeded_store().await;

    let query = format!("{{ memberType(id: {id}) {{ id discount postsLimitPerMonth }} }}");
    let data = data(execute(&store, &query).await);

    assert_eq!(
        data["memberType"],
        json!({ "id": id, "discount": discount, "postsLimitPerMonth": limit })
    );
}

#[tokio::test]
async fn test_unknown_member_type_fails_validation_without_store_call() {
    let (store, _seed) = seeded_store().await;

    let response = execute(&store, "{ memberType(id: UNKNOWN) { id } }").await;

    assert!(!response.errors.is_empty());
    assert_eq!(store.stats().total_reads(), 0);
}

#[tokio::test]
async fn test_missing_rows_resolve_to_null() {
    let (store, _seed) = seeded_store().await;
    let missing = Uuid::new_v4();

    let query = format!(
        r#"{{ user(id: "{missing}") {{ id }} post(id: "{missing}") {{ id }} profile(id: "{missing}") {{ id }} }}"#
    );
    let data = data(execute(&store, &query).await);

    assert_eq!(data, json!({ "user": null, "post": null, "profile": null }));
}

#[tokio::test]
async fn test_root_lists_return_every_row() {
    let (store, _seed) = seeded_store().await;

    let data = data(
        execute(
            &store,
            "{ posts { id author { name } } profiles { id user { name } } memberTypes { id } subscriptions { subscriberId authorId } }",
        )
        .await,
    );

    assert_eq!(data["posts"].as_array().unwrap().len(), 3);
    assert_eq!(data["profiles"].as_array().unwrap().len(), 2);
    assert_eq!(data["memberTypes"].as_array().unwrap().len(), 2);
    assert_eq!(data["subscriptions"].as_array().unwrap().len(), 3);

    let authors: Vec<_> = data["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["author"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(authors, ["alice", "alice", "bob"]);
    assert_eq!(store.stats().post_reads(), 1);
}

#[tokio::test]
async fn test_depth_limit_rejects_before_resolving() {
    let (store, _seed) = seeded_store().await;

    let response = execute(
        &store,
        "{ users { userSubscribedTo { userSubscribedTo { userSubscribedTo { userSubscribedTo { id } } } } } }",
    )
    .await;

    assert!(!response.errors.is_empty());
    assert_eq!(store.stats().total_reads(), 0);
}

#[tokio::test]
async fn test_root_list_failure_is_a_store_error_by_default() {
    let (store, _seed) = seeded_store().await;
    store.set_fail_reads(true);

    let response = execute(&store, "{ users { id } }").await;

    assert_eq!(first_error_code(&response).as_deref(), Some("STORE_ERROR"));
    assert_eq!(response.errors[0].message, "The data store is unavailable");
}

#[tokio::test]
async fn test_root_list_failure_answers_empty_with_fallback() {
    let (store, _seed) = seeded_store().await;
    store.set_fail_reads(true);
    let schema = SchemaBuilder::new()
        .list_field_fallback(ListFieldFallback::Empty)
        .build();

    let response = execute_on(&schema, &store, "{ users { id } memberTypes { id } }").await;

    assert_eq!(data(response), json!({ "users": [], "memberTypes": [] }));
}

#[tokio::test]
async fn test_store_error_is_field_level_and_siblings_resolve() {
    let (store, seed) = seeded_store().await;
    let schema = build_schema(&Config::default());
    let context = RequestContext::new(store.clone(), LoaderOptions::default());

    // Warm the user cache, then make every further read fail
    context.loaders.user(seed.alice.id).await.unwrap();
    store.set_fail_reads(true);

    let query = format!(
        r#"{{ user(id: "{}") {{ name }} post(id: "{}") {{ title }} }}"#,
        seed.alice.id, seed.alice_posts[0].id
    );
    let response = schema.execute(Request::new(query).data(context)).await;

    assert_eq!(first_error_code(&response).as_deref(), Some("STORE_ERROR"));
    assert_eq!(
        serde_json::to_value(&response.errors[0].path).unwrap(),
        json!(["post"])
    );

    let data = response.data.into_json().unwrap();
    assert_eq!(data["user"]["name"], "alice");
    assert!(data.get("post").map_or(true, |post| post.is_null()));
}

// ==================== Mutations ====================

#[tokio::test]
async fn test_subscribe_twice_is_already_subscribed() {
    let (store, seed) = seeded_store().await;
    let mutation = format!(
        r#"mutation {{ subscribeTo(userId: "{}", authorId: "{}") }}"#,
        seed.carol.id, seed.bob.id
    );

    let first = execute(&store, &mutation).await;
    assert_eq!(data(first), json!({ "subscribeTo": "Subscribed successfully" }));

    let second = execute(&store, &mutation).await;
    assert_eq!(
        first_error_code(&second).as_deref(),
        Some("ALREADY_SUBSCRIBED")
    );
}

#[tokio::test]
async fn test_unsubscribe_missing_edge_is_not_found() {
    let (store, seed) = seeded_store().await;
    let mutation = format!(
        r#"mutation {{ unsubscribeFrom(userId: "{}", authorId: "{}") }}"#,
        seed.carol.id, seed.bob.id
    );

    let response = execute(&store, &mutation).await;

    assert_eq!(first_error_code(&response).as_deref(), Some("NOT_FOUND"));
}

#[tokio::test]
async fn test_unsubscribe_removes_edge() {
    let (store, seed) = seeded_store().await;
    let mutation = format!(
        r#"mutation {{ unsubscribeFrom(userId: "{}", authorId: "{}") }}"#,
        seed.carol.id, seed.alice.id
    );

    let response = execute(&store, &mutation).await;
    assert_eq!(data(response), json!({ "unsubscribeFrom": "Unsubscribed successfully" }));

    let query = format!(r#"{{ user(id: "{}") {{ userSubscribedTo {{ id }} }} }}"#, seed.carol.id);
    let data = data(execute(&store, &query).await);
    assert_eq!(data["user"]["userSubscribedTo"], json!([]));
}

#[tokio::test]
async fn test_self_subscription_appears_in_both_lists() {
    let (store, seed) = seeded_store().await;
    let carol = seed.carol.id.to_string();

    let mutation = format!(r#"mutation {{ subscribeTo(userId: "{carol}", authorId: "{carol}") }}"#);
    data(execute(&store, &mutation).await);

    let query = format!(
        r#"{{ user(id: "{carol}") {{ userSubscribedTo {{ id }} subscribedToUser {{ id }} }} }}"#
    );
    let data = data(execute(&store, &query).await);

    assert!(ids(&data["user"]["userSubscribedTo"]).contains(&carol));
    assert_eq!(ids(&data["user"]["subscribedToUser"]), vec![carol]);
}

#[tokio::test]
async fn test_change_user_updates_only_supplied_fields() {
    let (store, seed) = seeded_store().await;

    let mutation = format!(
        r#"mutation {{ changeUser(id: "{}", dto: {{ balance: 5.5 }}) {{ name balance }} }}"#,
        seed.alice.id
    );
    let data = data(execute(&store, &mutation).await);

    assert_eq!(data["changeUser"], json!({ "name": "alice", "balance": 5.5 }));
}

#[tokio::test]
async fn test_change_missing_post_is_not_found() {
    let (store, _seed) = seeded_store().await;

    let mutation = format!(
        r#"mutation {{ changePost(id: "{}", dto: {{ title: "x" }}) {{ id }} }}"#,
        Uuid::new_v4()
    );
    let response = execute(&store, &mutation).await;

    assert_eq!(first_error_code(&response).as_deref(), Some("NOT_FOUND"));
}

#[tokio::test]
async fn test_second_profile_for_user_is_conflict() {
    let (store, seed) = seeded_store().await;

    let mutation = format!(
        r#"mutation {{ createProfile(dto: {{ isMale: true, yearOfBirth: 1985, userId: "{}", memberTypeId: BUSINESS }}) {{ id }} }}"#,
        seed.alice.id
    );
    let response = execute(&store, &mutation).await;

    assert_eq!(first_error_code(&response).as_deref(), Some("CONFLICT"));
}

#[tokio::test]
async fn test_create_profile_resolves_member_type() {
    let (store, seed) = seeded_store().await;

    let mutation = format!(
        r#"mutation {{ createProfile(dto: {{ isMale: true, yearOfBirth: 1985, userId: "{}", memberTypeId: BUSINESS }}) {{ userId memberType {{ discount }} user {{ name }} }} }}"#,
        seed.carol.id
    );
    let data = data(execute(&store, &mutation).await);

    assert_eq!(data["createProfile"]["userId"], seed.carol.id.to_string());
    assert_eq!(data["createProfile"]["memberType"]["discount"], 7.7);
    assert_eq!(data["createProfile"]["user"]["name"], "carol");
}

#[tokio::test]
async fn test_created_post_is_visible_through_author() {
    let (store, seed) = seeded_store().await;

    let mutation = format!(
        r#"mutation {{ createPost(dto: {{ title: "third", content: "c", authorId: "{}" }}) {{ author {{ posts {{ title }} }} }} }}"#,
        seed.alice.id
    );
    let data = data(execute(&store, &mutation).await);

    let titles: Vec<_> = data["createPost"]["author"]["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["first", "second", "third"]);
}

#[tokio::test]
async fn test_delete_user_removes_dependents() {
    let (store, seed) = seeded_store().await;

    let mutation = format!(r#"mutation {{ deleteUser(id: "{}") }}"#, seed.bob.id);
    let response = execute(&store, &mutation).await;
    assert_eq!(data(response), json!({ "deleteUser": "User deleted successfully" }));

    let data = data(execute(&store, "{ users { id } posts { id } subscriptions { authorId } }").await);
    assert_eq!(data["users"].as_array().unwrap().len(), 2);
    assert_eq!(data["posts"].as_array().unwrap().len(), 2);
    assert_eq!(data["subscriptions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_messages() {
    let (store, seed) = seeded_store().await;

    let mutation = format!(
        r#"mutation {{ deletePost(id: "{}") deleteProfile(id: "{}") }}"#,
        seed.alice_posts[0].id, seed.bob_profile.id
    );
    let data = data(execute(&store, &mutation).await);

    assert_eq!(
        data,
        json!({
            "deletePost": "Post deleted successfully",
            "deleteProfile": "Profile deleted successfully",
        })
    );
}
