/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Storage interface consumed by the ledger, notifier and readers.
//!
//! Every call is a separate round trip; nothing here spans more than one
//! document, so multi-step operations built on top are not atomic.

use crate::activity::{ActivityRecord, NewActivity};
use crate::social_db::{NewPost, NewUser, Post, PostPatch, User, UserPatch};
use anyhow::Result;
use async_trait::async_trait;
use murmur_protocol::{ActivityType, PageQuery};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFilter {
    pub id: Option<String>,
    /// Restricts to records referenced from this user's notification inbox.
    pub inbox_of: Option<String>,
    pub actor_id: Option<String>,
    pub not_actor_id: Option<String>,
    pub target_owner_id: Option<String>,
    pub post_id: Option<String>,
    pub kinds: Vec<ActivityType>,
    pub active: Option<bool>,
}

impl ActivityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn in_inbox(mut self, user_id: &str) -> Self {
        self.inbox_of = Some(user_id.to_string());
        self
    }

    pub fn actor(mut self, actor_id: &str) -> Self {
        self.actor_id = Some(actor_id.to_string());
        self
    }

    pub fn not_actor(mut self, actor_id: &str) -> Self {
        self.not_actor_id = Some(actor_id.to_string());
        self
    }

    pub fn target_owner(mut self, user_id: &str) -> Self {
        self.target_owner_id = Some(user_id.to_string());
        self
    }

    pub fn post(mut self, post_id: &str) -> Self {
        self.post_id = Some(post_id.to_string());
        self
    }

    pub fn kind(mut self, kind: ActivityType) -> Self {
        self.kinds = vec![kind];
        self
    }

    pub fn kinds(mut self, kinds: &[ActivityType]) -> Self {
        self.kinds = kinds.to_vec();
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityOrder {
    NewestFirst,
    /// Most recently edited first.
    LastUpdated,
    Insertion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_SIZE: u32 = 10;

    /// `page_number` is 1-based; the effective size is `min(page_size, limit)`.
    pub fn from_query(q: &PageQuery, default_size: u32, max_size: u32) -> Self {
        let default_size = default_size.max(1);
        let size = q
            .page_size
            .unwrap_or(default_size)
            .min(q.limit.unwrap_or(default_size))
            .clamp(1, max_size.max(1));
        let number = q.page_number.unwrap_or(1).max(1);
        Self {
            offset: (number - 1).saturating_mul(size),
            limit: size,
        }
    }
}

#[async_trait]
pub trait SocialStore: Send + Sync {
    async fn health_check(&self) -> Result<()>;

    async fn insert_activity(&self, activity: NewActivity) -> Result<ActivityRecord>;
    async fn find_activity(&self, filter: ActivityFilter) -> Result<Option<ActivityRecord>>;
    async fn find_activities(
        &self,
        filter: ActivityFilter,
        order: ActivityOrder,
        page: Option<Page>,
    ) -> Result<Vec<ActivityRecord>>;
    async fn count_activities(&self, filter: ActivityFilter) -> Result<u64>;
    /// Flips the oldest active record matching `filter` to inactive and returns it.
    async fn deactivate_activity(&self, filter: ActivityFilter) -> Result<Option<ActivityRecord>>;
    async fn update_comment_message(
        &self,
        activity_id: &str,
        actor_id: &str,
        message: &str,
    ) -> Result<Option<ActivityRecord>>;

    async fn append_notification(&self, user_id: &str, activity_id: &str) -> Result<()>;
    /// Inbox references in arrival order.

    async fn insert_user(&self, user: NewUser) -> Result<User>;
    async fn find_user(&self, user_id: &str) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_users(&self, ids: Vec<String>) -> Result<Vec<User>>;
    async fn search_users(&self, query: &str, limit: u32) -> Result<Vec<User>>;
    async fn count_users_with_email(&self, email: &str) -> Result<u64>;
    async fn update_user(&self, username: &str, patch: UserPatch) -> Result<Option<User>>;

    async fn insert_post(&self, post: NewPost) -> Result<Post>;
    async fn find_post(&self, post_id: &str) -> Result<Option<Post>>;
    async fn find_posts(&self, ids: Vec<String>) -> Result<Vec<Post>>;
    async fn list_posts(&self, owner_id: Option<&str>, page: Page) -> Result<Vec<Post>>;
    async fn update_post(&self, post_id: &str, patch: PostPatch) -> Result<Option<Post>>;
    /// Adds `delta` to an active post's `like_count`, never below zero.
    async fn adjust_like_count(&self, post_id: &str, delta: i64) -> Result<Option<Post>>;
    async fn set_like_count(&self, post_id: &str, value: i64) -> Result<Option<Post>>;
}
