/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

mod common;

use common::{fixture, post, rows, user};
use murmur_core::store::ActivityFilter;
use murmur_protocol::{ActivityType, CreatePostRequest, CreateUserRequest, PageQuery, UpdatePostRequest, UpdateUserRequest};

fn signup(username: &str, email: &str) -> CreateUserRequest {
    CreateUserRequest {
        name: format!("{username} name"),
        username: username.to_string(),
        email: email.to_string(),
        image: None,
        bio: None,
    }
}

#[tokio::test]
async fn duplicate_email_and_username_are_rejected() {
    let fx = fixture();
    let created = fx.engine.directory.create_user(signup("alice", "alice@example.test")).await;
    assert_eq!(created.message(), "User created");

    let same_email = fx.engine.directory.create_user(signup("alice2", "ALICE@example.test")).await;
    assert!(same_email.is_noop());
    assert_eq!(same_email.message(), "Email already exists");

    let same_name = fx.engine.directory.create_user(signup("alice", "other@example.test")).await;
    assert!(same_name.is_noop());
    assert_eq!(same_name.message(), "Username already exists");

    let missing = fx.engine.directory.create_user(signup("", "x@example.test")).await;
    assert!(missing.is_invalid());
}

#[tokio::test]
async fn users_can_be_found_and_updated() {
    let fx = fixture();
    user(&fx.engine, "alice").await;
    user(&fx.engine, "alina").await;
    user(&fx.engine, "bob").await;

    let found = fx.engine.directory.get_user("alice").await.into_data().unwrap();
    assert_eq!(found.email, "alice@example.test");
    assert!(fx.engine.directory.get_user("zed").await.is_not_found());

    let hits = fx.engine.directory.search_users("ALI").await.into_data().unwrap();
    let names: Vec<&str> = hits.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "alina"]);
    assert!(fx.engine.directory.search_users("  ").await.into_data().unwrap().is_empty());

    let updated = fx
        .engine
        .directory
        .update_user(UpdateUserRequest {
            username: "alice".to_string(),
            name: None,
            image: Some("me.png".to_string()),
            bio: Some("hello".to_string()),
        })
        .await
        .into_data()
        .unwrap();
    assert_eq!(updated.name, "alice");
    assert_eq!(updated.image.as_deref(), Some("me.png"));
    assert_eq!(updated.bio, "hello");
}

#[tokio::test]
async fn create_post_records_a_silent_audit_entry() {
    let fx = fixture();
    let carol = user(&fx.engine, "carol").await;

    let created = fx
        .engine
        .directory
        .create_post(
            &carol,
            CreatePostRequest {
                title: " sunset ".to_string(),
                description: Some("over the bay".to_string()),
                image: vec!["a.png".to_string(), " ".to_string()],
                tags: vec!["sky".to_string()],
                people: vec![],
                location: None,
            },
        )
        .await
        .into_data()
        .unwrap();
    assert_eq!(created.title, "sunset");
    assert_eq!(created.image, vec!["a.png".to_string()]);
    assert_eq!(created.like_count, 0);
    assert!(uuid::Uuid::parse_str(&created.post_ref).is_ok());

    let audit = rows(&fx.db, ActivityFilter::new().kind(ActivityType::CreatePost));
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].actor_id, carol.id);
    assert_eq!(audit[0].target_owner_id, carol.id);
    assert_eq!(audit[0].post_ref.as_deref(), Some(created.post_ref.as_str()));
    assert!(fx.db.list_notification_ids(&carol.id).unwrap().is_empty());

    let untitled = fx
        .engine
        .directory
        .create_post(&carol, CreatePostRequest::default())
        .await;
    assert!(untitled.is_invalid());
    assert_eq!(untitled.message(), "Title is required");
}

#[tokio::test]
async fn posts_list_newest_first_per_page() {
    let fx = fixture();
    let carol = user(&fx.engine, "carol").await;
    let bob = user(&fx.engine, "bob").await;
    for i in 0..3 {
        post(&fx.engine, &carol, &format!("c{i}")).await;
    }
    post(&fx.engine, &bob, "b0").await;

    let page = |n: u32, size: u32| PageQuery {
        page_number: Some(n),
        page_size: Some(size),
        limit: None,
    };
    let all = fx.engine.directory.list_posts(&PageQuery::default()).await.into_data().unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].title, "b0");

    let carols = fx
        .engine
        .directory
        .list_posts_by_user(&carol.id, &page(2, 2))
        .await
        .into_data()
        .unwrap();
    let titles: Vec<&str> = carols.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["c0"]);
}

#[tokio::test]
async fn only_the_author_updates_a_post() {
    let fx = fixture();
    let carol = user(&fx.engine, "carol").await;
    let bob = user(&fx.engine, "bob").await;
    let post_id = post(&fx.engine, &carol, "sunset").await;

    let patch = || UpdatePostRequest {
        title: Some("sunrise".to_string()),
        ..Default::default()
    };
    assert!(fx.engine.directory.update_post(&bob, &post_id, patch()).await.is_noop());
    assert!(fx.engine.directory.update_post(&carol, "missing", patch()).await.is_not_found());

    let updated = fx
        .engine
        .directory
        .update_post(&carol, &post_id, patch())
        .await
        .into_data()
        .unwrap();
    assert_eq!(updated.title, "sunrise");
    assert_eq!(updated.image, vec!["sunset.png".to_string()]);
    assert_eq!(fx.engine.directory.get_post(&post_id).await.into_data().unwrap().title, "sunrise");
}
