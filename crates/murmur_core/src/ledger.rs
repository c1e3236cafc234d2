/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! State-changing half of every social action.
//!
//! Each operation is a short sequence of independent store calls. There is no
//! transaction around them: a follow reads before it writes (two concurrent
//! follows can both pass the check) and a like bumps the counter before the
//! record is written (a failure in between leaves the counter ahead).

use crate::activity::{ActivityRecord, ActivityShapeError, ActivitySubject, NewActivity};
use crate::counters::LikeCounter;
use crate::notifier::Notifier;
use crate::outcome::Outcome;
use crate::social_db::Post;
use crate::store::{ActivityFilter, SocialStore};
use murmur_protocol::ActivityType;
use std::sync::Arc;
use tracing::{info, warn};

/// Authenticated caller of an operation, as supplied by the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub username: String,
    pub image: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image.filter(|s| !s.trim().is_empty());
        self
    }
}

#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn SocialStore>,
    notifier: Notifier,
    likes: LikeCounter,
}

impl Ledger {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self {
            notifier: Notifier::new(store.clone()),
            likes: LikeCounter::new(store.clone()),
            store,
        }
    }

    pub fn like_counter(&self) -> &LikeCounter {
        &self.likes
    }

    /// Returns the live follow if one exists instead of writing a second one.
    pub async fn record_follow(&self, actor: &Actor, target_owner_id: &str) -> Outcome<ActivityRecord> {
        if actor.id == target_owner_id {
            return Outcome::noop("You cannot follow yourself");
        }
        match self.store.find_user(target_owner_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Outcome::not_found("User does not exist"),
            Err(e) => return Outcome::failed(&e),
        }

        let live = self
            .store
            .find_activity(
                ActivityFilter::new()
                    .actor(&actor.id)
                    .target_owner(target_owner_id)
                    .kind(ActivityType::FollowUser)
                    .active(true),
            )
            .await;
        match live {
            Ok(Some(existing)) => return Outcome::done("Already following", existing),
            Ok(None) => {}
            Err(e) => return Outcome::failed(&e),
        }

        let follow = NewActivity::follow(&actor.id, &actor.username, target_owner_id).with_user_image(actor.image.clone());
        match self.notifier.trigger(follow, target_owner_id, true).await {
            Some(record) => {
                info!(actor = %actor.id, target = target_owner_id, activity_id = %record.id, "follow recorded");
                Outcome::done("Followed Successfully", record)
            }
            None => Outcome::Failed("Unable to follow user".to_string()),
        }
    }

    /// The `UNFOLLOW_USER` entry gets a fresh `activity_ref`; it links back to
    /// the follow through `reverses_id` only.
    pub async fn record_unfollow(&self, actor: &Actor, target_owner_id: &str) -> Outcome<ActivityRecord> {
        let origin = self
            .store
            .deactivate_activity(
                ActivityFilter::new()
                    .actor(&actor.id)
                    .target_owner(target_owner_id)
                    .kind(ActivityType::FollowUser),
            )
            .await;
        let origin = match origin {
            Ok(Some(r)) => r,
            Ok(None) => return Outcome::noop("Nothing to unfollow"),
            Err(e) => return Outcome::failed(&e),
        };
        self.write_reversal(&origin, actor, false, "Unfollowed Successfully", "Unable to record unfollow")
            .await
    }

    pub async fn record_comment(&self, actor: &Actor, post_id: &str, message: &str) -> Outcome<ActivityRecord> {
        let post = match self.load_post(post_id).await {
            Ok(p) => p,
            Err(out) => return out,
        };
        let comment = NewActivity::on_post(ActivityType::CommentPost, &actor.id, &actor.username, &post)
            .with_message(message.trim())
            .with_user_image(actor.image.clone());
        match comment.validate() {
            Ok(()) => {}
            Err(ActivityShapeError::EmptyMessage) => return Outcome::invalid("Comment message is required"),
            Err(e) => return Outcome::Failed(e.to_string()),
        }
        match self.notifier.trigger(comment, &post.owner_id, true).await {
            Some(record) => {
                info!(actor = %actor.id, post_id, activity_id = %record.id, "comment recorded");
                Outcome::done("Comment added", record)
            }
            None => Outcome::Failed("Unable to add comment".to_string()),
        }
    }

    /// Any caller may remove a comment; the reversal reuses the comment's `activity_ref`.
    pub async fn record_uncomment(&self, activity_id: &str, actor: &Actor) -> Outcome<ActivityRecord> {
        let origin = self
            .store
            .deactivate_activity(ActivityFilter::new().id(activity_id).kind(ActivityType::CommentPost))
            .await;
        let origin = match origin {
            Ok(Some(r)) => r,
            Ok(None) => return Outcome::not_found("Comment does not exist"),
            Err(e) => return Outcome::failed(&e),
        };
        self.write_reversal(&origin, actor, true, "Comment removed", "Unable to record comment removal")
            .await
    }

    pub async fn record_like(&self, actor: &Actor, post_id: &str) -> Outcome<ActivityRecord> {
        let post = match self.likes.increment(post_id).await {
            Ok(Some(p)) => p,
            Ok(None) => return Outcome::not_found("Post does not exist"),
            Err(e) => return Outcome::failed(&e),
        };
        let like = NewActivity::on_post(ActivityType::LikePost, &actor.id, &actor.username, &post)
            .with_user_image(actor.image.clone());
        match self.notifier.trigger(like, &post.owner_id, true).await {
            Some(record) => {
                info!(actor = %actor.id, post_id, like_count = post.like_count, "like recorded");
                Outcome::done("Liked Successfully", record)
            }
            None => {
                warn!(post_id, like_count = post.like_count, "like count incremented without a ledger record");
                Outcome::Failed("Unable to like post".to_string())
            }
        }
    }

    /// Any caller may remove a like; the reversal reuses the like's `activity_ref`.
    pub async fn record_unlike(&self, activity_id: &str, actor: &Actor) -> Outcome<ActivityRecord> {
        let origin = self
            .store
            .deactivate_activity(ActivityFilter::new().id(activity_id).kind(ActivityType::LikePost))
            .await;
        let origin = match origin {
            Ok(Some(r)) => r,
            Ok(None) => return Outcome::not_found("Like does not exist"),
            Err(e) => return Outcome::failed(&e),
        };

        let ActivitySubject::Post { post_id, .. } = origin.subject() else {
            return Outcome::Failed(format!("{} is not a like", origin.kind));
        };
        let post_id = post_id.to_string();
        match self.likes.decrement(&post_id).await {
            Ok(Some(_)) => {}
            Ok(None) => warn!(post_id = %post_id, "unlike of a missing post; like count untouched"),
            Err(e) => {
                warn!(post_id = %post_id, activity_id, "like deactivated but count not decremented");
                return Outcome::failed(&e);
            }
        }
        self.write_reversal(&origin, actor, true, "Unliked Successfully", "Unable to record unlike")
            .await
    }

    /// Self-action audit entry for a freshly created post.
    pub async fn record_post_created(&self, post: &Post) -> Outcome<ActivityRecord> {
        let created = NewActivity::on_post(ActivityType::CreatePost, &post.owner_id, &post.username, post);
        match self.notifier.trigger(created, &post.owner_id, true).await {
            Some(record) => Outcome::done("Post created", record),
            None => Outcome::Failed("Unable to record post creation".to_string()),
        }
    }

    /// Only the commenter can edit, and only while the comment is active.
    pub async fn edit_comment(&self, activity_id: &str, actor: &Actor, message: &str) -> Outcome<ActivityRecord> {
        let message = message.trim();
        if message.is_empty() {
            return Outcome::invalid("Comment message is required");
        }
        match self.store.update_comment_message(activity_id, &actor.id, message).await {
            Ok(Some(record)) => Outcome::done("Comment updated", record),
            Ok(None) => Outcome::not_found("Comment does not exist"),
            Err(e) => Outcome::failed(&e),
        }
    }

    async fn write_reversal(
        &self,
        origin: &ActivityRecord,
        actor: &Actor,
        reuse_ref: bool,
        done_message: &str,
        failed_message: &str,
    ) -> Outcome<ActivityRecord> {
        let Some(reversal) = NewActivity::reversal_of(origin, &actor.id, &actor.username, reuse_ref) else {
            return Outcome::Failed(format!("{} cannot be reversed", origin.kind));
        };
        let reversal = reversal.with_user_image(actor.image.clone());
        let kind = reversal.kind;
        match self.notifier.trigger(reversal, &origin.target_owner_id, false).await {
            Some(record) => {
                info!(%kind, actor = %actor.id, origin = %origin.id, "reversal recorded");
                Outcome::done(done_message, record)
            }
            None => {
                warn!(%kind, origin = %origin.id, "origin deactivated without a reversal record");
                Outcome::Failed(failed_message.to_string())
            }
        }
    }

    async fn load_post(&self, post_id: &str) -> Result<Post, Outcome<ActivityRecord>> {
        match self.store.find_post(post_id).await {
            Ok(Some(p)) if p.active => Ok(p),
            Ok(_) => Err(Outcome::not_found("Post does not exist")),
            Err(e) => Err(Outcome::failed(&e)),
        }
    }
}
