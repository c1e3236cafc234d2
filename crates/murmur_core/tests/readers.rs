/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

mod common;

use common::{fixture, post, user};
use murmur_protocol::{ActivityType, PageQuery};

#[tokio::test]
async fn activity_feed_keeps_reversed_history() {
    let fx = fixture();
    let alice = user(&fx.engine, "alice").await;
    let bob = user(&fx.engine, "bob").await;
    let post_id = post(&fx.engine, &alice, "first").await;

    fx.engine.ledger.record_follow(&alice, &bob.id).await.into_data().unwrap();
    fx.engine.ledger.record_unfollow(&alice, &bob.id).await.into_data().unwrap();

    let feed = fx.engine.feed.activity_feed(&alice.id).await.into_data().unwrap();
    let kinds: Vec<ActivityType> = feed.iter().map(|v| v.kind).collect();
    assert_eq!(
        kinds,
        vec![ActivityType::UnfollowUser, ActivityType::FollowUser, ActivityType::CreatePost]
    );
    assert!(!feed[1].active);
    assert_eq!(feed[2].post_id.as_deref(), Some(post_id.as_str()));
    assert_eq!(feed[2].creator_id, alice.id);

    // Nothing was done by bob.
    assert!(fx.engine.feed.activity_feed(&bob.id).await.into_data().unwrap().is_empty());
}

#[tokio::test]
async fn followers_and_following_are_live_sets() {
    let fx = fixture();
    let alice = user(&fx.engine, "alice").await;
    let bob = user(&fx.engine, "bob").await;
    let carol = user(&fx.engine, "carol").await;

    fx.engine.ledger.record_follow(&alice, &carol.id).await.into_data().unwrap();
    fx.engine.ledger.record_follow(&bob, &carol.id).await.into_data().unwrap();
    fx.engine.ledger.record_follow(&alice, &bob.id).await.into_data().unwrap();
    fx.engine.ledger.record_unfollow(&alice, &carol.id).await.into_data().unwrap();

    let followers = fx.engine.feed.followers(&carol.id).await.into_data().unwrap();
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].user_id, bob.id);

    let following = fx.engine.feed.following(&alice.id).await.into_data().unwrap();
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].creator_id, bob.id);
}

#[tokio::test]
async fn is_liked_hands_back_the_live_like() {
    let fx = fixture();
    let carol = user(&fx.engine, "carol").await;
    let bob = user(&fx.engine, "bob").await;
    let post_id = post(&fx.engine, &carol, "sunset").await;

    let before = fx.engine.feed.is_liked(&bob.id, &post_id).await.into_data().unwrap();
    assert!(!before.liked);
    assert!(before.activity_id.is_none());

    let like = fx.engine.ledger.record_like(&bob, &post_id).await.into_data().unwrap();
    let during = fx.engine.feed.is_liked(&bob.id, &post_id).await.into_data().unwrap();
    assert!(during.liked);
    assert_eq!(during.activity_id.as_deref(), Some(like.id.as_str()));

    fx.engine.ledger.record_unlike(&like.id, &bob).await.into_data().unwrap();
    assert!(!fx.engine.feed.is_liked(&bob.id, &post_id).await.into_data().unwrap().liked);
    assert!(fx.engine.feed.likers(&post_id).await.into_data().unwrap().is_empty());
}

#[tokio::test]
async fn comments_are_paged_newest_first() {
    let fx = fixture();
    let carol = user(&fx.engine, "carol").await;
    let bob = user(&fx.engine, "bob").await;
    let post_id = post(&fx.engine, &carol, "sunset").await;

    let mut ids = Vec::new();
    for i in 0..5 {
        let c = fx
            .engine
            .ledger
            .record_comment(&bob, &post_id, &format!("comment {i}"))
            .await
            .into_data()
            .unwrap();
        ids.push(c.id);
    }
    fx.engine.ledger.record_uncomment(&ids[4], &bob).await.into_data().unwrap();

    let first = fx
        .engine
        .feed
        .comments(
            &post_id,
            &PageQuery {
                page_number: Some(1),
                page_size: Some(2),
                limit: None,
            },
        )
        .await
        .into_data()
        .unwrap();
    let messages: Vec<&str> = first.iter().filter_map(|v| v.message.as_deref()).collect();
    assert_eq!(messages, vec!["comment 3", "comment 2"]);

    let second = fx
        .engine
        .feed
        .comments(
            &post_id,
            &PageQuery {
                page_number: Some(2),
                page_size: Some(10),
                limit: Some(2),
            },
        )
        .await
        .into_data()
        .unwrap();
    let messages: Vec<&str> = second.iter().filter_map(|v| v.message.as_deref()).collect();
    assert_eq!(messages, vec!["comment 1", "comment 0"]);

    let all = fx.engine.feed.comments(&post_id, &PageQuery::default()).await.into_data().unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|v| v.kind == ActivityType::CommentPost && v.active));
}

#[tokio::test]
async fn edited_comment_moves_to_the_top() {
    let fx = fixture();
    let carol = user(&fx.engine, "carol").await;
    let bob = user(&fx.engine, "bob").await;
    let post_id = post(&fx.engine, &carol, "sunset").await;

    let older = fx.engine.ledger.record_comment(&bob, &post_id, "first").await.into_data().unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    fx.engine.ledger.record_comment(&bob, &post_id, "second").await.into_data().unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    fx.engine.ledger.edit_comment(&older.id, &bob, "first, edited").await.into_data().unwrap();

    let all = fx.engine.feed.comments(&post_id, &PageQuery::default()).await.into_data().unwrap();
    let messages: Vec<&str> = all.iter().filter_map(|v| v.message.as_deref()).collect();
    assert_eq!(messages, vec!["first, edited", "second"]);
}
