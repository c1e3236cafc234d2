/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Cached `like_count` on posts.
//!
//! The counter is adjusted by direct increments next to the ledger write, not
//! recomputed. The two writes are independent, so the cache can drift from the
//! ledger; `like_drift` reports it and `reconcile_likes` repairs it on demand.

use crate::outcome::Outcome;
use crate::social_db::Post;
use crate::store::{ActivityFilter, SocialStore};
use anyhow::{Context, Result};
use murmur_protocol::ActivityType;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeDrift {
    pub cached: i64,
    pub derived: i64,
}

impl LikeDrift {
    pub fn is_consistent(&self) -> bool {
        self.cached == self.derived
    }
}

#[derive(Clone)]
pub struct LikeCounter {
    store: Arc<dyn SocialStore>,
}

impl LikeCounter {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    /// `None` when the post does not exist or is inactive.
    pub async fn increment(&self, post_id: &str) -> Result<Option<Post>> {
        self.store
            .adjust_like_count(post_id, 1)
            .await
            .with_context(|| format!("increment like count of {post_id}"))
    }

    /// Never goes below zero.
    pub async fn decrement(&self, post_id: &str) -> Result<Option<Post>> {
        self.store
            .adjust_like_count(post_id, -1)
            .await
            .with_context(|| format!("decrement like count of {post_id}"))
    }

    async fn derived_likes(&self, post_id: &str) -> Result<i64> {
        let n = self
            .store
            .count_activities(
                ActivityFilter::new()
                    .post(post_id)
                    .kind(ActivityType::LikePost)
                    .active(true),
            )
            .await?;
        Ok(n as i64)
    }

    pub async fn like_drift(&self, post_id: &str) -> Outcome<LikeDrift> {
        let post = match self.store.find_post(post_id).await {
            Ok(Some(p)) => p,
            Ok(None) => return Outcome::not_found("Post does not exist"),
            Err(e) => return Outcome::failed(&e),
        };
        match self.derived_likes(post_id).await {
            Ok(derived) => Outcome::done(
                "Like count checked",
                LikeDrift {
                    cached: post.like_count,
                    derived,
                },
            ),
            Err(e) => Outcome::failed(&e),
        }
    }

    /// Overwrites the cached count with the number of active likes.
    pub async fn reconcile_likes(&self, post_id: &str) -> Outcome<LikeDrift> {
        let before = match self.like_drift(post_id).await {
            Outcome::Done { data: Some(d), .. } => d,
            other => return other,
        };
        if before.is_consistent() {
            return Outcome::done("Like count already consistent", before);
        }
        match self.store.set_like_count(post_id, before.derived).await {
            Ok(Some(post)) => {
                info!(post_id, cached = before.cached, derived = before.derived, "like count reconciled");
                Outcome::done(
                    "Like count reconciled",
                    LikeDrift {
                        cached: post.like_count,
                        derived: before.derived,
                    },
                )
            }
            Ok(None) => Outcome::not_found("Post does not exist"),
            Err(e) => Outcome::failed(&e),
        }
    }
}
