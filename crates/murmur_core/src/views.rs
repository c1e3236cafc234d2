/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::activity::ActivityRecord;
use crate::social_db::{Post, User};
use crate::store::SocialStore;
use anyhow::Result;
use murmur_protocol::{ActivityView, PostView, UserView};
use std::collections::{BTreeSet, HashMap};

pub fn ms_to_rfc3339(ms: i64) -> String {
    let render = || -> Option<String> {
        let secs = ms.checked_div(1000)?;
        let nanos = ms.rem_euclid(1000) * 1_000_000;
        let dt = time::OffsetDateTime::from_unix_timestamp(secs).ok()? + time::Duration::nanoseconds(nanos);
        dt.format(&time::format_description::well_known::Rfc3339).ok()
    };
    render().unwrap_or_default()
}

pub fn user_view(user: &User) -> UserView {
    UserView {
        id: user.id.clone(),
        name: user.name.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        image: user.image.clone(),
        bio: user.bio.clone(),
        created_at: ms_to_rfc3339(user.created_at_ms),
    }
}

pub fn post_view(post: &Post) -> PostView {
    PostView {
        id: post.id.clone(),
        user_id: post.owner_id.clone(),
        username: post.username.clone(),
        post_ref: post.post_ref.clone(),
        title: post.title.clone(),
        description: post.description.clone(),
        image: post.images.clone(),
        tags: post.tags.clone(),
        people: post.people.clone(),
        location: post.location.clone(),
        like_count: post.like_count,
        active: post.active,
        created_at: ms_to_rfc3339(post.created_at_ms),
        updated_at: ms_to_rfc3339(post.updated_at_ms),
    }
}

/// Resolves the identities referenced by a batch of records in two lookups.
pub async fn resolve_activities(store: &dyn SocialStore, records: &[ActivityRecord]) -> Result<Vec<ActivityView>> {
    let user_ids: BTreeSet<String> = records
        .iter()
        .flat_map(|r| [r.actor_id.clone(), r.target_owner_id.clone()])
        .collect();
    let post_ids: BTreeSet<String> = records.iter().filter_map(|r| r.post_id.clone()).collect();

    let users: HashMap<String, User> = store
        .find_users(user_ids.into_iter().collect())
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();
    let posts: HashMap<String, Post> = store
        .find_posts(post_ids.into_iter().collect())
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    Ok(records.iter().map(|r| activity_view(r, &users, &posts)).collect())
}

/// View of a single record without identity lookups.
pub fn record_view(r: &ActivityRecord) -> ActivityView {
    activity_view(r, &HashMap::new(), &HashMap::new())
}

fn activity_view(r: &ActivityRecord, users: &HashMap<String, User>, posts: &HashMap<String, Post>) -> ActivityView {
    let actor = users.get(&r.actor_id);
    let owner = users.get(&r.target_owner_id);
    let post = r.post_id.as_ref().and_then(|id| posts.get(id));
    ActivityView {
        id: r.id.clone(),
        activity_ref: r.activity_ref.clone(),
        kind: r.kind,
        user_id: r.actor_id.clone(),
        creator_id: r.target_owner_id.clone(),
        username: r.username.clone(),
        creator_username: owner.map(|u| u.username.clone()),
        post_id: r.post_id.clone(),
        post_ref: r.post_ref.clone(),
        post_title: post.map(|p| p.title.clone()),
        message: r.message.clone(),
        active: r.active,
        reverses_id: r.reverses_id.clone(),
        likes_count: r.likes_count,
        creator_image: r
            .creator_image
            .clone()
            .or_else(|| owner.and_then(|u| u.image.clone())),
        user_image: r.user_image.clone().or_else(|| actor.and_then(|u| u.image.clone())),
        created_at: ms_to_rfc3339(r.created_at_ms),
        updated_at: ms_to_rfc3339(r.updated_at_ms),
    }
}
