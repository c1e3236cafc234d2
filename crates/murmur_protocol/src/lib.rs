/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of entries in the activity ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    CreatePost,
    FollowUser,
    UnfollowUser,
    LikePost,
    RemoveLikePost,
    CommentPost,
    RemoveCommentPost,
}

impl ActivityType {
    pub const ALL: [ActivityType; 7] = [
        ActivityType::CreatePost,
        ActivityType::FollowUser,
        ActivityType::UnfollowUser,
        ActivityType::LikePost,
        ActivityType::RemoveLikePost,
        ActivityType::CommentPost,
        ActivityType::RemoveCommentPost,
    ];

    /// Kinds that show up in a notification inbox.
    pub const NOTIFYING: [ActivityType; 3] = [
        ActivityType::FollowUser,
        ActivityType::LikePost,
        ActivityType::CommentPost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatePost => "CREATE_POST",
            Self::FollowUser => "FOLLOW_USER",
            Self::UnfollowUser => "UNFOLLOW_USER",
            Self::LikePost => "LIKE_POST",
            Self::RemoveLikePost => "REMOVE_LIKE_POST",
            Self::CommentPost => "COMMENT_POST",
            Self::RemoveCommentPost => "REMOVE_COMMENT_POST",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == input.trim())
    }

    pub fn is_post_scoped(self) -> bool {
        !matches!(self, Self::FollowUser | Self::UnfollowUser)
    }

    pub fn is_comment(self) -> bool {
        matches!(self, Self::CommentPost | Self::RemoveCommentPost)
    }

    pub fn is_reversal(self) -> bool {
        self.reverses().is_some()
    }

    /// The kind this reversal undoes.
    pub fn reverses(self) -> Option<Self> {
        match self {
            Self::UnfollowUser => Some(Self::FollowUser),
            Self::RemoveLikePost => Some(Self::LikePost),
            Self::RemoveCommentPost => Some(Self::CommentPost),
            _ => None,
        }
    }

    pub fn is_notifying(self) -> bool {
        Self::NOTIFYING.contains(&self)
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result object returned verbatim to HTTP callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            data: None,
            error: None,
            token: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            message: None,
            data: None,
            error: Some(error.into()),
            token: None,
        }
    }
}

/// Ledger entry as shown to clients, with identities resolved to display data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    pub id: String,
    pub activity_ref: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub user_id: String,
    pub creator_id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverses_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub bio: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub post_ref: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub location: String,
    pub like_count: i64,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowCheck {
    pub following: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LikeCheck {
    pub liked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub message: String,
    #[serde(default)]
    pub user_image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    #[serde(default)]
    pub user_image: Option<String>,
}

/// Pagination as accepted on query strings (`pageNumber`, `pageSize`, `limit`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}
