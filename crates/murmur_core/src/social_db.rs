/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::activity::{ActivityRecord, NewActivity};
use crate::store::{ActivityFilter, ActivityOrder, Page, SocialStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use murmur_protocol::ActivityType;
use rand::{rngs::OsRng, RngCore};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;

const BUSY_TIMEOUT_MS: u64 = 5_000;
/// Stays well under SQLite's bound-variable limit (32766).
const MAX_IDS_PER_QUERY: usize = 500;

const ACTIVITY_COLUMNS: &str = "id, activity_ref, type, actor_id, target_owner_id, username, post_id, post_ref, message, active, reverses_id, likes_count, creator_image, user_image, created_at_ms, updated_at_ms";
const USER_COLUMNS: &str = "id, name, username, email, image, bio, created_at_ms, updated_at_ms";
const POST_COLUMNS: &str = "id, owner_id, username, post_ref, title, description, images_json, tags_json, people_json, location, like_count, active, created_at_ms, updated_at_ms";

#[derive(Clone)]
pub struct SocialDb {
    path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub image: Option<String>,
    pub bio: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub image: Option<String>,
    pub bio: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub owner_id: String,
    pub username: String,
    pub post_ref: String,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub people: Vec<String>,
    pub location: String,
    pub like_count: i64,
    pub active: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub owner_id: String,
    pub username: String,
    pub post_ref: String,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub people: Vec<String>,
    pub location: String,
}

#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub location: Option<String>,
}

impl SocialDb {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| format!("create db dir: {}", parent.display()))?;
        }
        let conn = Connection::open(&path).with_context(|| format!("open db: {}", path.display()))?;
        conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
              seq INTEGER PRIMARY KEY AUTOINCREMENT,
              id TEXT NOT NULL UNIQUE,
              name TEXT NOT NULL,
              username TEXT NOT NULL,
              email TEXT NOT NULL,
              image TEXT NULL,
              bio TEXT NOT NULL DEFAULT '',
              created_at_ms INTEGER NOT NULL,
              updated_at_ms INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

            CREATE TABLE IF NOT EXISTS posts (
              seq INTEGER PRIMARY KEY AUTOINCREMENT,
              id TEXT NOT NULL UNIQUE,
              owner_id TEXT NOT NULL,
              username TEXT NOT NULL,
              post_ref TEXT NOT NULL,
              title TEXT NOT NULL,
              description TEXT NOT NULL DEFAULT '',
              images_json TEXT NOT NULL DEFAULT '[]',
              tags_json TEXT NOT NULL DEFAULT '[]',
              people_json TEXT NOT NULL DEFAULT '[]',
              location TEXT NOT NULL DEFAULT '',
              like_count INTEGER NOT NULL DEFAULT 0,
              active INTEGER NOT NULL DEFAULT 1,
              created_at_ms INTEGER NOT NULL,
              updated_at_ms INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_posts_owner ON posts(owner_id, updated_at_ms DESC);
            CREATE INDEX IF NOT EXISTS idx_posts_updated ON posts(updated_at_ms DESC);

            -- Append-mostly ledger. Rows are never deleted; only `active`
            -- (and a comment's `message`) change after insert.
            -- No uniqueness on (actor, target, type): callers read before write.
            CREATE TABLE IF NOT EXISTS activities (
              seq INTEGER PRIMARY KEY AUTOINCREMENT,
              id TEXT NOT NULL UNIQUE,
              activity_ref TEXT NOT NULL,
              type TEXT NOT NULL,
              actor_id TEXT NOT NULL,
              target_owner_id TEXT NOT NULL,
              username TEXT NOT NULL,
              post_id TEXT NULL,
              post_ref TEXT NULL,
              message TEXT NULL,
              active INTEGER NOT NULL DEFAULT 1,
              reverses_id TEXT NULL,
              likes_count INTEGER NULL,
              creator_image TEXT NULL,
              user_image TEXT NULL,
              created_at_ms INTEGER NOT NULL,
              updated_at_ms INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_activities_actor ON activities(actor_id, type, active);
            CREATE INDEX IF NOT EXISTS idx_activities_target ON activities(target_owner_id, type);
            CREATE INDEX IF NOT EXISTS idx_activities_post ON activities(post_id, type, active);
            CREATE INDEX IF NOT EXISTS idx_activities_ref ON activities(activity_ref);

            -- Notification inbox: pure append, duplicates allowed.
            CREATE TABLE IF NOT EXISTS user_notifications (
              seq INTEGER PRIMARY KEY AUTOINCREMENT,
              user_id TEXT NOT NULL,
              activity_id TEXT NOT NULL,
              created_at_ms INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_user_notifications_user ON user_notifications(user_id, seq);
            "#,
        )?;
        Ok(Self { path })
    }

    fn conn(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).with_context(|| format!("open db: {}", self.path.display()))?;
        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;
        Ok(conn)
    }

    pub fn health_check(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    fn new_id(&self) -> String {
        let mut b = [0u8; 16];
        OsRng.fill_bytes(&mut b);
        b.iter().map(|v| format!("{v:02x}")).collect()
    }

    pub fn insert_activity(&self, activity: &NewActivity) -> Result<ActivityRecord> {
        activity.validate().context("invalid activity")?;
        let id = self.new_id();
        let now = now_ms();
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO activities(
              id, activity_ref, type, actor_id, target_owner_id, username, post_id, post_ref, message,
              active, reverses_id, likes_count, creator_image, user_image, created_at_ms, updated_at_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?11, ?12, ?13, ?14, ?14)
            "#,
            params![
                id,
                activity.activity_ref,
                activity.kind.as_str(),
                activity.actor_id,
                activity.target_owner_id,
                activity.username,
                activity.post_id,
                activity.post_ref,
                activity.message,
                activity.reverses_id,
                activity.likes_count,
                activity.creator_image,
                activity.user_image,
                now
            ],
        )?;
        Ok(ActivityRecord {
            id,
            activity_ref: activity.activity_ref.clone(),
            kind: activity.kind,
            actor_id: activity.actor_id.clone(),
            target_owner_id: activity.target_owner_id.clone(),
            username: activity.username.clone(),
            post_id: activity.post_id.clone(),
            post_ref: activity.post_ref.clone(),
            message: activity.message.clone(),
            active: true,
            reverses_id: activity.reverses_id.clone(),
            likes_count: activity.likes_count,
            creator_image: activity.creator_image.clone(),
            user_image: activity.user_image.clone(),
            created_at_ms: now,
            updated_at_ms: now,
        })
    }

    pub fn find_activity(&self, filter: &ActivityFilter) -> Result<Option<ActivityRecord>> {
        let (where_sql, args) = activity_where(filter);
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE {where_sql} ORDER BY seq ASC LIMIT 1"),
            params_from_iter(args),
            activity_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn find_activities(
        &self,
        filter: &ActivityFilter,
        order: ActivityOrder,
        page: Option<Page>,
    ) -> Result<Vec<ActivityRecord>> {
        let (where_sql, mut args) = activity_where(filter);
        let order_sql = match order {
            ActivityOrder::NewestFirst => "created_at_ms DESC, seq DESC",
            ActivityOrder::LastUpdated => "updated_at_ms DESC, seq DESC",
            ActivityOrder::Insertion => "seq ASC",
        };
        let mut sql = format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE {where_sql} ORDER BY {order_sql}");
        if let Some(page) = page {
            sql.push_str(" LIMIT ? OFFSET ?");
            args.push(Value::from(page.limit as i64));
            args.push(Value::from(page.offset as i64));
        }
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), activity_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_activities(&self, filter: &ActivityFilter) -> Result<u64> {
        let (where_sql, args) = activity_where(filter);
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM activities WHERE {where_sql}"),
            params_from_iter(args),
            |r| r.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    pub fn deactivate_activity(&self, filter: &ActivityFilter) -> Result<Option<ActivityRecord>> {
        let mut filter = filter.clone();
        filter.active = Some(true);
        let (where_sql, args) = activity_where(&filter);

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let seq: Option<i64> = tx
            .query_row(
                &format!("SELECT seq FROM activities WHERE {where_sql} ORDER BY seq ASC LIMIT 1"),
                params_from_iter(args),
                |r| r.get(0),
            )
            .optional()?;
        let Some(seq) = seq else {
            return Ok(None);
        };
        tx.execute(
            "UPDATE activities SET active=0, updated_at_ms=?2 WHERE seq=?1 AND active=1",
            params![seq, now_ms()],
        )?;
        let row = tx.query_row(
            &format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE seq=?1"),
            params![seq],
            activity_from_row,
        )?;
        tx.commit()?;
        Ok(Some(row))
    }

    pub fn update_comment_message(&self, activity_id: &str, actor_id: &str, message: &str) -> Result<Option<ActivityRecord>> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE activities SET message=?3, updated_at_ms=?4 WHERE id=?1 AND actor_id=?2 AND type=?5 AND active=1",
            params![activity_id, actor_id, message, now_ms(), ActivityType::CommentPost.as_str()],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        conn.query_row(
            &format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id=?1"),
            params![activity_id],
            activity_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn append_notification(&self, user_id: &str, activity_id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO user_notifications(user_id, activity_id, created_at_ms) VALUES (?1, ?2, ?3)",
            params![user_id, activity_id, now_ms()],
        )?;
        Ok(())
    }

    pub fn list_notification_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT activity_id FROM user_notifications WHERE user_id=?1 ORDER BY seq ASC")?;
        let rows = stmt
            .query_map(params![user_id], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn insert_user(&self, user: &NewUser) -> Result<User> {
        let id = self.new_id();
        let now = now_ms();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users(id, name, username, email, image, bio, created_at_ms, updated_at_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![id, user.name, user.username, user.email, user.image, user.bio, now],
        )?;
        Ok(User {
            id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
            bio: user.bio.clone(),
            created_at_ms: now,
            updated_at_ms: now,
        })
    }

    pub fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id=?1"),
            params![user_id],
            user_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.trim();
        if username.is_empty() {
            return Ok(None);
        }
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username=?1 ORDER BY seq ASC LIMIT 1"),
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn find_users(&self, ids: &[String]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let conn = self.conn()?;
        let mut out = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id IN ({})",
                placeholders(chunk.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), user_from_row)?;
            out.extend(rows.collect::<rusqlite::Result<Vec<_>>>()?);
        }
        Ok(out)
    }

    pub fn search_users(&self, query: &str, limit: u32) -> Result<Vec<User>> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Ok(vec![]);
        }
        let pattern = format!("%{}%", escape_like(&q));
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE lower(username) LIKE ?1 ESCAPE '\' OR lower(name) LIKE ?1 ESCAPE '\'
            ORDER BY (lower(username) = ?2) DESC, username ASC
            LIMIT ?3
            "#
        ))?;
        let rows = stmt.query_map(params![pattern, q, limit.max(1).min(200)], user_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_users_with_email(&self, email: &str) -> Result<u64> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE lower(email)=lower(?1)",
            params![email.trim()],
            |r| r.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    pub fn update_user(&self, username: &str, patch: &UserPatch) -> Result<Option<User>> {
        let Some(user) = self.find_user_by_username(username)? else {
            return Ok(None);
        };
        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE users SET
              name=COALESCE(?2, name),
              image=COALESCE(?3, image),
              bio=COALESCE(?4, bio),
              updated_at_ms=?5
            WHERE id=?1
            "#,
            params![user.id, patch.name, patch.image, patch.bio, now_ms()],
        )?;
        self.find_user(&user.id)
    }

    pub fn insert_post(&self, post: &NewPost) -> Result<Post> {
        let id = self.new_id();
        let now = now_ms();
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO posts(
              id, owner_id, username, post_ref, title, description, images_json, tags_json, people_json,
              location, like_count, active, created_at_ms, updated_at_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, 1, ?11, ?11)
            "#,
            params![
                id,
                post.owner_id,
                post.username,
                post.post_ref,
                post.title,
                post.description,
                serde_json::to_string(&post.images)?,
                serde_json::to_string(&post.tags)?,
                serde_json::to_string(&post.people)?,
                post.location,
                now
            ],
        )?;
        Ok(Post {
            id,
            owner_id: post.owner_id.clone(),
            username: post.username.clone(),
            post_ref: post.post_ref.clone(),
            title: post.title.clone(),
            description: post.description.clone(),
            images: post.images.clone(),
            tags: post.tags.clone(),
            people: post.people.clone(),
            location: post.location.clone(),
            like_count: 0,
            active: true,
            created_at_ms: now,
            updated_at_ms: now,
        })
    }

    pub fn find_post(&self, post_id: &str) -> Result<Option<Post>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE id=?1"),
            params![post_id],
            post_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn find_posts(&self, ids: &[String]) -> Result<Vec<Post>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let conn = self.conn()?;
        let mut out = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM posts WHERE id IN ({})",
                placeholders(chunk.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), post_from_row)?;
            out.extend(rows.collect::<rusqlite::Result<Vec<_>>>()?);
        }
        Ok(out)
    }

    pub fn list_posts(&self, owner_id: Option<&str>, page: Page) -> Result<Vec<Post>> {
        let conn = self.conn()?;
        let (sql, args): (String, Vec<Value>) = match owner_id {
            Some(owner) => (
                format!("SELECT {POST_COLUMNS} FROM posts WHERE owner_id=?1 ORDER BY updated_at_ms DESC, seq DESC LIMIT ?2 OFFSET ?3"),
                vec![owner.to_string().into(), (page.limit as i64).into(), (page.offset as i64).into()],
            ),
            None => (
                format!("SELECT {POST_COLUMNS} FROM posts ORDER BY updated_at_ms DESC, seq DESC LIMIT ?1 OFFSET ?2"),
                vec![(page.limit as i64).into(), (page.offset as i64).into()],
            ),
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), post_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_post(&self, post_id: &str, patch: &PostPatch) -> Result<Option<Post>> {
        let images = patch.images.as_ref().map(serde_json::to_string).transpose()?;
        let tags = patch.tags.as_ref().map(serde_json::to_string).transpose()?;
        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE posts SET
              title=COALESCE(?2, title),
              description=COALESCE(?3, description),
              images_json=COALESCE(?4, images_json),
              tags_json=COALESCE(?5, tags_json),
              location=COALESCE(?6, location),
              updated_at_ms=?7
            WHERE id=?1
            "#,
            params![post_id, patch.title, patch.description, images, tags, patch.location, now_ms()],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.find_post(post_id)
    }

    pub fn adjust_like_count(&self, post_id: &str, delta: i64) -> Result<Option<Post>> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE posts SET like_count=MAX(like_count + ?2, 0) WHERE id=?1 AND active=1",
            params![post_id, delta],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.find_post(post_id)
    }

    pub fn set_like_count(&self, post_id: &str, value: i64) -> Result<Option<Post>> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE posts SET like_count=?2 WHERE id=?1",
            params![post_id, value.max(0)],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.find_post(post_id)
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(SocialDb) -> Result<T> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(db))
            .await
            .context("db task panicked")?
    }
}

#[async_trait]
impl SocialStore for SocialDb {
    async fn health_check(&self) -> Result<()> {
        self.blocking(|db| db.health_check()).await
    }

    async fn insert_activity(&self, activity: NewActivity) -> Result<ActivityRecord> {
        self.blocking(move |db| db.insert_activity(&activity)).await
    }

    async fn find_activity(&self, filter: ActivityFilter) -> Result<Option<ActivityRecord>> {
        self.blocking(move |db| db.find_activity(&filter)).await
    }

    async fn find_activities(
        &self,
        filter: ActivityFilter,
        order: ActivityOrder,
        page: Option<Page>,
    ) -> Result<Vec<ActivityRecord>> {
        self.blocking(move |db| db.find_activities(&filter, order, page)).await
    }

    async fn count_activities(&self, filter: ActivityFilter) -> Result<u64> {
        self.blocking(move |db| db.count_activities(&filter)).await
    }

    async fn deactivate_activity(&self, filter: ActivityFilter) -> Result<Option<ActivityRecord>> {
        self.blocking(move |db| db.deactivate_activity(&filter)).await
    }

    async fn update_comment_message(
        &self,
        activity_id: &str,
        actor_id: &str,
        message: &str,
    ) -> Result<Option<ActivityRecord>> {
        let (activity_id, actor_id, message) = (activity_id.to_string(), actor_id.to_string(), message.to_string());
        self.blocking(move |db| db.update_comment_message(&activity_id, &actor_id, &message))
            .await
    }

    async fn append_notification(&self, user_id: &str, activity_id: &str) -> Result<()> {
        let (user_id, activity_id) = (user_id.to_string(), activity_id.to_string());
        self.blocking(move |db| db.append_notification(&user_id, &activity_id)).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        self.blocking(move |db| db.insert_user(&user)).await
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        let user_id = user_id.to_string();
        self.blocking(move |db| db.find_user(&user_id)).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_string();
        self.blocking(move |db| db.find_user_by_username(&username)).await
    }

    async fn find_users(&self, ids: Vec<String>) -> Result<Vec<User>> {
        self.blocking(move |db| db.find_users(&ids)).await
    }

    async fn search_users(&self, query: &str, limit: u32) -> Result<Vec<User>> {
        let query = query.to_string();
        self.blocking(move |db| db.search_users(&query, limit)).await
    }

    async fn count_users_with_email(&self, email: &str) -> Result<u64> {
        let email = email.to_string();
        self.blocking(move |db| db.count_users_with_email(&email)).await
    }

    async fn update_user(&self, username: &str, patch: UserPatch) -> Result<Option<User>> {
        let username = username.to_string();
        self.blocking(move |db| db.update_user(&username, &patch)).await
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        self.blocking(move |db| db.insert_post(&post)).await
    }

    async fn find_post(&self, post_id: &str) -> Result<Option<Post>> {
        let post_id = post_id.to_string();
        self.blocking(move |db| db.find_post(&post_id)).await
    }

    async fn find_posts(&self, ids: Vec<String>) -> Result<Vec<Post>> {
        self.blocking(move |db| db.find_posts(&ids)).await
    }

    async fn list_posts(&self, owner_id: Option<&str>, page: Page) -> Result<Vec<Post>> {
        let owner_id = owner_id.map(str::to_string);
        self.blocking(move |db| db.list_posts(owner_id.as_deref(), page)).await
    }

    async fn update_post(&self, post_id: &str, patch: PostPatch) -> Result<Option<Post>> {
        let post_id = post_id.to_string();
        self.blocking(move |db| db.update_post(&post_id, &patch)).await
    }

    async fn adjust_like_count(&self, post_id: &str, delta: i64) -> Result<Option<Post>> {
        let post_id = post_id.to_string();
        self.blocking(move |db| db.adjust_like_count(&post_id, delta)).await
    }

    async fn set_like_count(&self, post_id: &str, value: i64) -> Result<Option<Post>> {
        let post_id = post_id.to_string();
        self.blocking(move |db| db.set_like_count(&post_id, value)).await
    }
}

/// Builds a `WHERE` body with anonymous `?` placeholders for `filter`.
fn activity_where(filter: &ActivityFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    if let Some(id) = &filter.id {
        clauses.push("id=?".to_string());
        args.push(Value::from(id.clone()));
    }
    if let Some(user_id) = &filter.inbox_of {
        clauses.push("id IN (SELECT activity_id FROM user_notifications WHERE user_id=?)".to_string());
        args.push(Value::from(user_id.clone()));
    }
    for (column, value) in [
        ("actor_id", &filter.actor_id),
        ("target_owner_id", &filter.target_owner_id),
        ("post_id", &filter.post_id),
    ] {
        if let Some(v) = value {
            clauses.push(format!("{column}=?"));
            args.push(Value::from(v.clone()));
        }
    }
    if let Some(v) = &filter.not_actor_id {
        clauses.push("actor_id<>?".to_string());
        args.push(Value::from(v.clone()));
    }
    if !filter.kinds.is_empty() {
        clauses.push(format!("type IN ({})", placeholders(filter.kinds.len())));
        args.extend(filter.kinds.iter().map(|k| Value::from(k.as_str().to_string())));
    }
    if let Some(active) = filter.active {
        clauses.push("active=?".to_string());
        args.push(Value::from(if active { 1i64 } else { 0 }));
    }

    if clauses.is_empty() {
        ("1".to_string(), args)
    } else {
        (clauses.join(" AND "), args)
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn activity_from_row(r: &Row<'_>) -> rusqlite::Result<ActivityRecord> {
    let kind: String = r.get(2)?;
    let kind = ActivityType::parse(&kind).ok_or_else(|| rusqlite::Error::InvalidColumnType(2, "type".to_string(), Type::Text))?;
    Ok(ActivityRecord {
        id: r.get(0)?,
        activity_ref: r.get(1)?,
        kind,
        actor_id: r.get(3)?,
        target_owner_id: r.get(4)?,
        username: r.get(5)?,
        post_id: r.get(6)?,
        post_ref: r.get(7)?,
        message: r.get(8)?,
        active: r.get::<_, i64>(9)? != 0,
        reverses_id: r.get(10)?,
        likes_count: r.get(11)?,
        creator_image: r.get(12)?,
        user_image: r.get(13)?,
        created_at_ms: r.get(14)?,
        updated_at_ms: r.get(15)?,
    })
}

fn user_from_row(r: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: r.get(0)?,
        name: r.get(1)?,
        username: r.get(2)?,
        email: r.get(3)?,
        image: r.get(4)?,
        bio: r.get(5)?,
        created_at_ms: r.get(6)?,
        updated_at_ms: r.get(7)?,
    })
}

fn post_from_row(r: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: r.get(0)?,
        owner_id: r.get(1)?,
        username: r.get(2)?,
        post_ref: r.get(3)?,
        title: r.get(4)?,
        description: r.get(5)?,
        images: json_list(&r.get::<_, String>(6)?),
        tags: json_list(&r.get::<_, String>(7)?),
        people: json_list(&r.get::<_, String>(8)?),
        location: r.get(9)?,
        like_count: r.get(10)?,
        active: r.get::<_, i64>(11)? != 0,
        created_at_ms: r.get(12)?,
        updated_at_ms: r.get(13)?,
    })
}

fn json_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn escape_like(input: &str) -> String {
    input.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
