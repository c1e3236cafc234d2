/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

mod common;

use common::{fixture, post, rows, user};
use murmur_core::ledger::Actor;
use murmur_core::store::ActivityFilter;
use murmur_protocol::ActivityType;

#[tokio::test]
async fn follow_then_unfollow_toggles_state() {
    let fx = fixture();
    let alice = user(&fx.engine, "alice").await;
    let bob = user(&fx.engine, "bob").await;

    let followed = fx.engine.ledger.record_follow(&alice, &bob.id).await;
    let follow = followed.into_data().unwrap();
    assert_eq!(follow.kind, ActivityType::FollowUser);
    assert!(follow.active);
    assert!(fx.engine.feed.is_following(&alice.id, &bob.id).await.data().unwrap().following);

    let following = fx.engine.feed.following(&alice.id).await.into_data().unwrap();
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].creator_id, bob.id);
    assert_eq!(following[0].creator_username.as_deref(), Some("bob"));

    let unfollowed = fx.engine.ledger.record_unfollow(&alice, &bob.id).await;
    assert_eq!(unfollowed.message(), "Unfollowed Successfully");
    let unfollow = unfollowed.into_data().unwrap();
    assert!(!fx.engine.feed.is_following(&alice.id, &bob.id).await.data().unwrap().following);

    let pair = rows(&fx.db, ActivityFilter::new().actor(&alice.id).target_owner(&bob.id));
    assert_eq!(pair.len(), 2);
    assert_eq!(pair[0].kind, ActivityType::FollowUser);
    assert!(!pair[0].active);
    assert_eq!(pair[1].kind, ActivityType::UnfollowUser);
    assert!(pair[1].active);
    assert_ne!(unfollow.activity_ref, follow.activity_ref);
    assert_eq!(unfollow.reverses_id.as_deref(), Some(follow.id.as_str()));
}

#[tokio::test]
async fn unfollow_without_follow_is_a_noop() {
    let fx = fixture();
    let alice = user(&fx.engine, "alice").await;
    let bob = user(&fx.engine, "bob").await;

    let out = fx.engine.ledger.record_unfollow(&alice, &bob.id).await;
    assert!(out.is_noop());
    assert_eq!(out.message(), "Nothing to unfollow");
    assert!(rows(&fx.db, ActivityFilter::new()).is_empty());
}

#[tokio::test]
async fn repeated_follow_returns_the_live_record() {
    let fx = fixture();
    let alice = user(&fx.engine, "alice").await;
    let bob = user(&fx.engine, "bob").await;

    let first = fx.engine.ledger.record_follow(&alice, &bob.id).await.into_data().unwrap();
    let second = fx.engine.ledger.record_follow(&alice, &bob.id).await;
    assert_eq!(second.message(), "Already following");
    assert_eq!(second.into_data().unwrap().id, first.id);

    let follows = rows(&fx.db, ActivityFilter::new().kind(ActivityType::FollowUser));
    assert_eq!(follows.len(), 1);
    assert_eq!(fx.db.list_notification_ids(&bob.id).unwrap(), vec![first.id]);
}

#[tokio::test]
async fn follow_rejects_self_and_unknown_users() {
    let fx = fixture();
    let alice = user(&fx.engine, "alice").await;

    assert!(fx.engine.ledger.record_follow(&alice, &alice.id).await.is_noop());
    let ghost = fx.engine.ledger.record_follow(&alice, "no-such-user").await;
    assert!(ghost.is_not_found());
    assert_eq!(ghost.message(), "User does not exist");
    assert!(rows(&fx.db, ActivityFilter::new().kind(ActivityType::FollowUser)).is_empty());
}

#[tokio::test]
async fn uncomment_reuses_the_comment_ref() {
    let fx = fixture();
    let carol = user(&fx.engine, "carol").await;
    let bob = user(&fx.engine, "bob").await;
    let post_id = post(&fx.engine, &carol, "sunset").await;

    let comment = fx
        .engine
        .ledger
        .record_comment(&bob, &post_id, "  lovely  ")
        .await
        .into_data()
        .unwrap();
    assert_eq!(comment.message.as_deref(), Some("lovely"));
    assert_eq!(comment.target_owner_id, carol.id);

    let removed = fx.engine.ledger.record_uncomment(&comment.id, &bob).await.into_data().unwrap();
    assert_eq!(removed.kind, ActivityType::RemoveCommentPost);
    assert_eq!(removed.activity_ref, comment.activity_ref);
    assert_eq!(removed.reverses_id.as_deref(), Some(comment.id.as_str()));
    assert_eq!(removed.post_id.as_deref(), Some(post_id.as_str()));

    let origin = fx.db.find_activity(&ActivityFilter::new().id(&comment.id)).unwrap().unwrap();
    assert!(!origin.active);

    // Only the comment reached carol's inbox.
    assert_eq!(fx.db.list_notification_ids(&carol.id).unwrap(), vec![comment.id.clone()]);

    let again = fx.engine.ledger.record_uncomment(&comment.id, &bob).await;
    assert!(again.is_not_found());
}

#[tokio::test]
async fn anyone_can_remove_a_comment() {
    let fx = fixture();
    let carol = user(&fx.engine, "carol").await;
    let bob = user(&fx.engine, "bob").await;
    let dave = user(&fx.engine, "dave").await;
    let post_id = post(&fx.engine, &carol, "sunset").await;

    let comment = fx.engine.ledger.record_comment(&bob, &post_id, "hi").await.into_data().unwrap();
    let removed = fx.engine.ledger.record_uncomment(&comment.id, &dave).await.into_data().unwrap();
    assert_eq!(removed.actor_id, dave.id);
}

#[tokio::test]
async fn comment_checks_post_and_message() {
    let fx = fixture();
    let carol = user(&fx.engine, "carol").await;
    let bob = user(&fx.engine, "bob").await;
    let post_id = post(&fx.engine, &carol, "sunset").await;

    let missing = fx.engine.ledger.record_comment(&bob, "nope", "hi").await;
    assert!(missing.is_not_found());
    assert_eq!(missing.message(), "Post does not exist");

    let empty = fx.engine.ledger.record_comment(&bob, &post_id, "   ").await;
    assert!(empty.is_invalid());
    let resp = empty.into_response();
    assert_eq!(resp.message.as_deref(), Some("Comment message is required"));
    assert!(resp.error.is_none());
    assert!(rows(&fx.db, ActivityFilter::new().kind(ActivityType::CommentPost)).is_empty());
}

#[tokio::test]
async fn only_the_commenter_edits() {
    let fx = fixture();
    let carol = user(&fx.engine, "carol").await;
    let bob = user(&fx.engine, "bob").await;
    let post_id = post(&fx.engine, &carol, "sunset").await;
    let comment = fx.engine.ledger.record_comment(&bob, &post_id, "hi").await.into_data().unwrap();

    assert!(fx.engine.ledger.edit_comment(&comment.id, &bob, " ").await.is_invalid());

    let by_carol = fx.engine.ledger.edit_comment(&comment.id, &carol, "hijacked").await;
    assert!(by_carol.is_not_found());

    let edited = fx.engine.ledger.edit_comment(&comment.id, &bob, "hello").await.into_data().unwrap();
    assert_eq!(edited.message.as_deref(), Some("hello"));
    assert_eq!(edited.activity_ref, comment.activity_ref);
    assert!(edited.active);

    fx.engine.ledger.record_uncomment(&comment.id, &bob).await;
    assert!(fx.engine.ledger.edit_comment(&comment.id, &bob, "late").await.is_not_found());
}

#[tokio::test]
async fn like_on_missing_post_writes_nothing() {
    let fx = fixture();
    let bob = user(&fx.engine, "bob").await;
    let out = fx.engine.ledger.record_like(&bob, "missing").await;
    assert!(out.is_not_found());
    assert!(rows(&fx.db, ActivityFilter::new().kind(ActivityType::LikePost)).is_empty());
}

#[tokio::test]
async fn unlike_reuses_the_like_ref() {
    let fx = fixture();
    let carol = user(&fx.engine, "carol").await;
    let bob = Actor::new("bob-id", "bob");
    let post_id = post(&fx.engine, &carol, "sunset").await;

    let like = fx.engine.ledger.record_like(&bob, &post_id).await.into_data().unwrap();
    assert_eq!(like.likes_count, Some(1));
    assert_eq!(like.creator_image.as_deref(), Some("sunset.png"));

    let unlike = fx.engine.ledger.record_unlike(&like.id, &bob).await;
    assert_eq!(unlike.message(), "Unliked Successfully");
    let unlike = unlike.into_data().unwrap();
    assert_eq!(unlike.kind, ActivityType::RemoveLikePost);
    assert_eq!(unlike.activity_ref, like.activity_ref);
    assert_eq!(unlike.reverses_id.as_deref(), Some(like.id.as_str()));

    assert!(fx.engine.ledger.record_unlike(&like.id, &bob).await.is_not_found());
}
