/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Read models derived from the ledger.

use crate::activity::ActivityRecord;
use crate::outcome::Outcome;
use crate::store::{ActivityFilter, ActivityOrder, Page, SocialStore};
use crate::views::resolve_activities;
use anyhow::Result;
use murmur_protocol::{ActivityType, ActivityView, FollowCheck, LikeCheck, PageQuery};
use std::sync::Arc;

#[derive(Clone)]
pub struct Feed {
    store: Arc<dyn SocialStore>,
    default_page_size: u32,
    max_page_size: u32,
}

impl Feed {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self {
            store,
            default_page_size: Page::DEFAULT_SIZE,
            max_page_size: 100,
        }
    }

    pub fn with_page_sizes(mut self, default_page_size: u32, max_page_size: u32) -> Self {
        self.default_page_size = default_page_size.max(1);
        self.max_page_size = max_page_size.max(1);
        self
    }

    /// Everything `user_id` did, reversed actions included.
    pub async fn activity_feed(&self, user_id: &str) -> Outcome<Vec<ActivityView>> {
        self.list(
            ActivityFilter::new().actor(user_id),
            ActivityOrder::NewestFirst,
            None,
            "Activity feed",
        )
        .await
    }

    /// Actions of others on `user_id`'s account and posts. Reversals are audit only
    /// and never show up here.
    pub async fn notifications(&self, user_id: &str) -> Outcome<Vec<ActivityView>> {
        self.list(
            ActivityFilter::new()
                .target_owner(user_id)
                .not_actor(user_id)
                .kinds(&ActivityType::NOTIFYING),
            ActivityOrder::NewestFirst,
            None,
            "Notifications",
        )
        .await
    }

    /// The fan-out inbox resolved to records. Repeated references show once.
    pub async fn notification_inbox(&self, user_id: &str) -> Outcome<Vec<ActivityView>> {
        self.list(
            ActivityFilter::new().in_inbox(user_id).kinds(&ActivityType::NOTIFYING),
            ActivityOrder::NewestFirst,
            None,
            "Notification inbox",
        )
        .await
    }

    pub async fn following(&self, user_id: &str) -> Outcome<Vec<ActivityView>> {
        self.list(
            ActivityFilter::new()
                .actor(user_id)
                .kind(ActivityType::FollowUser)
                .active(true),
            ActivityOrder::Insertion,
            None,
            "Following",
        )
        .await
    }

    pub async fn followers(&self, user_id: &str) -> Outcome<Vec<ActivityView>> {
        self.list(
            ActivityFilter::new()
                .target_owner(user_id)
                .kind(ActivityType::FollowUser)
                .active(true),
            ActivityOrder::Insertion,
            None,
            "Followers",
        )
        .await
    }

    pub async fn is_following(&self, actor_id: &str, target_owner_id: &str) -> Outcome<FollowCheck> {
        let filter = ActivityFilter::new()
            .actor(actor_id)
            .target_owner(target_owner_id)
            .kind(ActivityType::FollowUser)
            .active(true);
        match self.store.count_activities(filter).await {
            Ok(n) => Outcome::done("Follow status", FollowCheck { following: n > 0 }),
            Err(e) => Outcome::failed(&e),
        }
    }

    /// Also hands back the live like's id so the caller can reverse it.
    pub async fn is_liked(&self, actor_id: &str, post_id: &str) -> Outcome<LikeCheck> {
        let filter = ActivityFilter::new()
            .actor(actor_id)
            .post(post_id)
            .kind(ActivityType::LikePost)
            .active(true);
        match self.store.find_activity(filter).await {
            Ok(found) => Outcome::done(
                "Like status",
                LikeCheck {
                    liked: found.is_some(),
                    activity_id: found.map(|r| r.id),
                },
            ),
            Err(e) => Outcome::failed(&e),
        }
    }

    pub async fn likers(&self, post_id: &str) -> Outcome<Vec<ActivityView>> {
        self.list(
            ActivityFilter::new()
                .post(post_id)
                .kind(ActivityType::LikePost)
                .active(true),
            ActivityOrder::NewestFirst,
            None,
            "Likes",
        )
        .await
    }

    /// An edited comment moves back to the top.
    pub async fn comments(&self, post_id: &str, query: &PageQuery) -> Outcome<Vec<ActivityView>> {
        let page = Page::from_query(query, self.default_page_size, self.max_page_size);
        self.list(
            ActivityFilter::new()
                .post(post_id)
                .kind(ActivityType::CommentPost)
                .active(true),
            ActivityOrder::LastUpdated,
            Some(page),
            "Comments",
        )
        .await
    }

    async fn list(
        &self,
        filter: ActivityFilter,
        order: ActivityOrder,
        page: Option<Page>,
        message: &str,
    ) -> Outcome<Vec<ActivityView>> {
        match self.fetch(filter, order, page).await {
            Ok(views) => Outcome::done(message, views),
            Err(e) => Outcome::failed(&e),
        }
    }

    async fn fetch(&self, filter: ActivityFilter, order: ActivityOrder, page: Option<Page>) -> Result<Vec<ActivityView>> {
        let records: Vec<ActivityRecord> = self.store.find_activities(filter, order, page).await?;
        resolve_activities(self.store.as_ref(), &records).await
    }
}
