/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use murmur_core::activity::{ActivityRecord, NewActivity};
use murmur_core::ledger::Actor;
use murmur_core::social_db::{NewPost, NewUser, Post, PostPatch, SocialDb, User, UserPatch};
use murmur_core::store::{ActivityFilter, ActivityOrder, Page, SocialStore};
use murmur_core::Engine;
use murmur_protocol::{ActivityType, CreatePostRequest, CreateUserRequest};
use std::sync::atomic::{AtomicBool, Ordering};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Barrier;

pub struct Fixture {
    _dir: TempDir,
    pub db_path: PathBuf,
    pub db: SocialDb,
    pub engine: Engine,
}

pub fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("murmur.db");
    let db = SocialDb::open(&db_path).unwrap();
    let engine = Engine::new(Arc::new(db.clone()));
    Fixture {
        _dir: dir,
        db_path,
        db,
        engine,
    }
}

pub struct FaultyFixture {
    _dir: TempDir,
    pub db: SocialDb,
    pub store: Arc<FaultyStore>,
    pub engine: Engine,
}

pub fn faulty_fixture(follow_gate: Option<Arc<Barrier>>) -> FaultyFixture {
    let dir = TempDir::new().unwrap();
    let db = SocialDb::open(dir.path().join("murmur.db")).unwrap();
    let store = Arc::new(FaultyStore::new(db.clone(), follow_gate));
    let engine = Engine::new(store.clone());
    FaultyFixture {
        _dir: dir,
        db,
        store,
        engine,
    }
}

pub async fn user(engine: &Engine, username: &str) -> Actor {
    let created = engine
        .directory
        .create_user(CreateUserRequest {
            name: username.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.test"),
            image: None,
            bio: None,
        })
        .await;
    let view = created.into_data().unwrap();
    Actor::new(view.id, view.username)
}

pub async fn post(engine: &Engine, author: &Actor, title: &str) -> String {
    let created = engine
        .directory
        .create_post(
            author,
            CreatePostRequest {
                title: title.to_string(),
                image: vec![format!("{title}.png")],
                ..Default::default()
            },
        )
        .await;
    created.into_data().unwrap().id
}

/// Ledger rows for `filter` in insertion order, read straight from SQLite.
pub fn rows(db: &SocialDb, filter: ActivityFilter) -> Vec<ActivityRecord> {
    db.find_activities(&filter, ActivityOrder::Insertion, None).unwrap()
}

pub fn like_count(db: &SocialDb, post_id: &str) -> i64 {
    db.find_post(post_id).unwrap().unwrap().like_count
}

/// Real store with switchable failures.
pub struct FaultyStore {
    inner: SocialDb,
    pub fail_insert_activity: AtomicBool,
    pub fail_append_notification: AtomicBool,
    pub fail_adjust_like_count: AtomicBool,
    follow_gate: Option<Arc<Barrier>>,
}

impl FaultyStore {
    pub fn new(inner: SocialDb, follow_gate: Option<Arc<Barrier>>) -> Self {
        Self {
            inner,
            fail_insert_activity: AtomicBool::new(false),
            fail_append_notification: AtomicBool::new(false),
            fail_adjust_like_count: AtomicBool::new(false),
            follow_gate,
        }
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(anyhow!("injected failure: {what}"));
        }
        Ok(())
    }
}

#[async_trait]
impl SocialStore for FaultyStore {
    async fn health_check(&self) -> Result<()> {
        SocialStore::health_check(&self.inner).await
    }

    async fn insert_activity(&self, activity: NewActivity) -> Result<ActivityRecord> {
        Self::check(&self.fail_insert_activity, "insert_activity")?;
        SocialStore::insert_activity(&self.inner, activity).await
    }

    async fn find_activity(&self, filter: ActivityFilter) -> Result<Option<ActivityRecord>> {
        let is_follow_check = filter.kinds == [ActivityType::FollowUser] && filter.active == Some(true);
        let found = SocialStore::find_activity(&self.inner, filter).await?;
        if is_follow_check {
            if let Some(gate) = &self.follow_gate {
                gate.wait().await;
            }
        }
        Ok(found)
    }

    async fn find_activities(
        &self,
        filter: ActivityFilter,
        order: ActivityOrder,
        page: Option<Page>,
    ) -> Result<Vec<ActivityRecord>> {
        SocialStore::find_activities(&self.inner, filter, order, page).await
    }

    async fn count_activities(&self, filter: ActivityFilter) -> Result<u64> {
        SocialStore::count_activities(&self.inner, filter).await
    }

    async fn deactivate_activity(&self, filter: ActivityFilter) -> Result<Option<ActivityRecord>> {
        SocialStore::deactivate_activity(&self.inner, filter).await
    }

    async fn update_comment_message(
        &self,
        activity_id: &str,
        actor_id: &str,
        message: &str,
    ) -> Result<Option<ActivityRecord>> {
        SocialStore::update_comment_message(&self.inner, activity_id, actor_id, message).await
    }

    async fn append_notification(&self, user_id: &str, activity_id: &str) -> Result<()> {
        Self::check(&self.fail_append_notification, "append_notification")?;
        SocialStore::append_notification(&self.inner, user_id, activity_id).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        SocialStore::insert_user(&self.inner, user).await
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        SocialStore::find_user(&self.inner, user_id).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        SocialStore::find_user_by_username(&self.inner, username).await
    }

    async fn find_users(&self, ids: Vec<String>) -> Result<Vec<User>> {
        SocialStore::find_users(&self.inner, ids).await
    }

    async fn search_users(&self, query: &str, limit: u32) -> Result<Vec<User>> {
        SocialStore::search_users(&self.inner, query, limit).await
    }

    async fn count_users_with_email(&self, email: &str) -> Result<u64> {
        SocialStore::count_users_with_email(&self.inner, email).await
    }

    async fn update_user(&self, username: &str, patch: UserPatch) -> Result<Option<User>> {
        SocialStore::update_user(&self.inner, username, patch).await
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        SocialStore::insert_post(&self.inner, post).await
    }

    async fn find_post(&self, post_id: &str) -> Result<Option<Post>> {
        SocialStore::find_post(&self.inner, post_id).await
    }

    async fn find_posts(&self, ids: Vec<String>) -> Result<Vec<Post>> {
        SocialStore::find_posts(&self.inner, ids).await
    }

    async fn list_posts(&self, owner_id: Option<&str>, page: Page) -> Result<Vec<Post>> {
        SocialStore::list_posts(&self.inner, owner_id, page).await
    }

    async fn update_post(&self, post_id: &str, patch: PostPatch) -> Result<Option<Post>> {
        SocialStore::update_post(&self.inner, post_id, patch).await
    }

    async fn adjust_like_count(&self, post_id: &str, delta: i64) -> Result<Option<Post>> {
        Self::check(&self.fail_adjust_like_count, "adjust_like_count")?;
        SocialStore::adjust_like_count(&self.inner, post_id, delta).await
    }

    async fn set_like_count(&self, post_id: &str, value: i64) -> Result<Option<Post>> {
        SocialStore::set_like_count(&self.inner, post_id, value).await
    }
}
