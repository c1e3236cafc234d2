/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Ledger entries and the rules a new entry must satisfy before it is written.

use crate::social_db::Post;
use murmur_protocol::ActivityType;
use std::fmt;
use uuid::Uuid;

/// One row of the activity ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    pub id: String,
    pub activity_ref: String,
    pub kind: ActivityType,
    pub actor_id: String,
    pub target_owner_id: String,
    pub username: String,
    pub post_id: Option<String>,
    pub post_ref: Option<String>,
    pub message: Option<String>,
    pub active: bool,
    /// Origin record of a reversal entry.
    pub reverses_id: Option<String>,
    pub likes_count: Option<i64>,
    pub creator_image: Option<String>,
    pub user_image: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// Who did what to whom, per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySubject<'a> {
    Follow {
        follower: &'a str,
        followee: &'a str,
        reversed: bool,
    },
    Post {
        actor: &'a str,
        author: &'a str,
        post_id: &'a str,
        kind: ActivityType,
    },
    Comment {
        commenter: &'a str,
        author: &'a str,
        post_id: &'a str,
        message: Option<&'a str>,
        reversed: bool,
    },
}

impl ActivityRecord {
    pub fn subject(&self) -> ActivitySubject<'_> {
        let post_id = self.post_id.as_deref().unwrap_or_default();
        match self.kind {
            ActivityType::FollowUser | ActivityType::UnfollowUser => ActivitySubject::Follow {
                follower: &self.actor_id,
                followee: &self.target_owner_id,
                reversed: self.kind == ActivityType::UnfollowUser,
            },
            ActivityType::CommentPost | ActivityType::RemoveCommentPost => ActivitySubject::Comment {
                commenter: &self.actor_id,
                author: &self.target_owner_id,
                post_id,
                message: self.message.as_deref(),
                reversed: self.kind == ActivityType::RemoveCommentPost,
            },
            kind => ActivitySubject::Post {
                actor: &self.actor_id,
                author: &self.target_owner_id,
                post_id,
                kind,
            },
        }
    }
}

/// A ledger entry that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub activity_ref: String,
    pub kind: ActivityType,
    pub actor_id: String,
    pub target_owner_id: String,
    pub username: String,
    pub post_id: Option<String>,
    pub post_ref: Option<String>,
    pub message: Option<String>,
    pub reverses_id: Option<String>,
    pub likes_count: Option<i64>,
    pub creator_image: Option<String>,
    pub user_image: Option<String>,
}

pub fn new_activity_ref() -> String {
    Uuid::new_v4().to_string()
}

impl NewActivity {
    pub fn follow(actor_id: &str, username: &str, target_owner_id: &str) -> Self {
        Self::bare(ActivityType::FollowUser, actor_id, username, target_owner_id)
    }

    /// Entry scoped to `post`; the post's owner becomes the target.
    pub fn on_post(kind: ActivityType, actor_id: &str, username: &str, post: &Post) -> Self {
        let mut out = Self::bare(kind, actor_id, username, &post.owner_id);
        out.post_id = Some(post.id.clone());
        out.post_ref = Some(post.post_ref.clone());
        out.creator_image = post.images.first().cloned();
        out.likes_count = Some(post.like_count);
        out
    }

    /// Reversal entry for `origin`. `reuse_ref` keeps the origin's correlation token.
    pub fn reversal_of(origin: &ActivityRecord, actor_id: &str, username: &str, reuse_ref: bool) -> Option<Self> {
        let kind = match origin.kind {
            ActivityType::FollowUser => ActivityType::UnfollowUser,
            ActivityType::LikePost => ActivityType::RemoveLikePost,
            ActivityType::CommentPost => ActivityType::RemoveCommentPost,
            _ => return None,
        };
        let mut out = Self::bare(kind, actor_id, username, &origin.target_owner_id);
        if reuse_ref {
            out.activity_ref = origin.activity_ref.clone();
        }
        out.post_id = origin.post_id.clone();
        out.post_ref = origin.post_ref.clone();
        if kind == ActivityType::RemoveCommentPost {
            out.message = origin.message.clone();
        }
        out.reverses_id = Some(origin.id.clone());
        Some(out)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_user_image(mut self, image: Option<String>) -> Self {
        self.user_image = image.filter(|s| !s.trim().is_empty());
        self
    }

    fn bare(kind: ActivityType, actor_id: &str, username: &str, target_owner_id: &str) -> Self {
        Self {
            activity_ref: new_activity_ref(),
            kind,
            actor_id: actor_id.to_string(),
            target_owner_id: target_owner_id.to_string(),
            username: username.to_string(),
            post_id: None,
            post_ref: None,
            message: None,
            reverses_id: None,
            likes_count: None,
            creator_image: None,
            user_image: None,
        }
    }

    pub fn validate(&self) -> Result<(), ActivityShapeError> {
        for (field, value) in [
            ("activity_ref", &self.activity_ref),
            ("actor_id", &self.actor_id),
            ("target_owner_id", &self.target_owner_id),
            ("username", &self.username),
        ] {
            if value.trim().is_empty() {
                return Err(ActivityShapeError::MissingField(field));
            }
        }

        let has_post = self.post_id.as_deref().is_some_and(|s| !s.is_empty())
            && self.post_ref.as_deref().is_some_and(|s| !s.is_empty());
        if self.kind.is_post_scoped() && !has_post {
            return Err(ActivityShapeError::MissingPost(self.kind));
        }
        if !self.kind.is_post_scoped() && (self.post_id.is_some() || self.post_ref.is_some()) {
            return Err(ActivityShapeError::UnexpectedPost(self.kind));
        }

        match (&self.message, self.kind) {
            (Some(_), k) if !k.is_comment() => return Err(ActivityShapeError::UnexpectedMessage(k)),
            (None, ActivityType::CommentPost) => return Err(ActivityShapeError::EmptyMessage),
            (Some(m), ActivityType::CommentPost) if m.trim().is_empty() => {
                return Err(ActivityShapeError::EmptyMessage)
            }
            _ => {}
        }

        match (self.kind.is_reversal(), self.reverses_id.is_some()) {
            (true, false) => Err(ActivityShapeError::MissingOrigin(self.kind)),
            (false, true) => Err(ActivityShapeError::UnexpectedOrigin(self.kind)),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityShapeError {
    MissingField(&'static str),
    MissingPost(ActivityType),
    UnexpectedPost(ActivityType),
    UnexpectedMessage(ActivityType),
    EmptyMessage,
    MissingOrigin(ActivityType),
    UnexpectedOrigin(ActivityType),
}

impl fmt::Display for ActivityShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "activity field `{field}` is empty"),
            Self::MissingPost(kind) => write!(f, "{kind} requires a post"),
            Self::UnexpectedPost(kind) => write!(f, "{kind} must not reference a post"),
            Self::UnexpectedMessage(kind) => write!(f, "{kind} must not carry a message"),
            Self::EmptyMessage => f.write_str("comment message is empty"),
            Self::MissingOrigin(kind) => write!(f, "{kind} must reference the record it reverses"),
            Self::UnexpectedOrigin(kind) => write!(f, "{kind} is not a reversal"),
        }
    }
}

impl std::error::Error for ActivityShapeError {}
