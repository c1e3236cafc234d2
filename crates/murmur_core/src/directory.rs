/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Users and posts. Plain resource CRUD around the ledger.

use crate::activity::new_activity_ref;
use crate::ledger::{Actor, Ledger};
use crate::outcome::Outcome;
use crate::social_db::{NewPost, NewUser, PostPatch, UserPatch};
use crate::store::{Page, SocialStore};
use crate::views::{post_view, user_view};
use murmur_protocol::{CreatePostRequest, CreateUserRequest, PageQuery, PostView, UpdatePostRequest, UpdateUserRequest, UserView};
use std::sync::Arc;
use tracing::{info, warn};

const SEARCH_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn SocialStore>,
    ledger: Ledger,
    default_page_size: u32,
    max_page_size: u32,
}

fn clean(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn clean_list(v: Vec<String>) -> Vec<String> {
    v.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Directory {
    pub fn new(store: Arc<dyn SocialStore>, ledger: Ledger) -> Self {
        Self {
            store,
            ledger,
            default_page_size: Page::DEFAULT_SIZE,
            max_page_size: 100,
        }
    }

    pub fn with_page_sizes(mut self, default_page_size: u32, max_page_size: u32) -> Self {
        self.default_page_size = default_page_size.max(1);
        self.max_page_size = max_page_size.max(1);
        self
    }

    pub async fn create_user(&self, req: CreateUserRequest) -> Outcome<UserView> {
        let name = req.name.trim().to_string();
        let username = req.username.trim().to_string();
        let email = req.email.trim().to_lowercase();
        if name.is_empty() || username.is_empty() || email.is_empty() {
            return Outcome::invalid("Name, username and email are required");
        }

        match self.store.count_users_with_email(&email).await {
            Ok(0) => {}
            Ok(_) => return Outcome::noop("Email already exists"),
            Err(e) => return Outcome::failed(&e),
        }
        match self.store.find_user_by_username(&username).await {
            Ok(None) => {}
            Ok(Some(_)) => return Outcome::noop("Username already exists"),
            Err(e) => return Outcome::failed(&e),
        }

        let new_user = NewUser {
            name,
            username,
            email,
            image: clean(req.image),
            bio: clean(req.bio).unwrap_or_default(),
        };
        match self.store.insert_user(new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, username = %user.username, "user created");
                Outcome::done("User created", user_view(&user))
            }
            Err(e) => Outcome::failed(&e),
        }
    }

    pub async fn get_user(&self, username: &str) -> Outcome<UserView> {
        match self.store.find_user_by_username(username).await {
            Ok(Some(user)) => Outcome::done("User found", user_view(&user)),
            Ok(None) => Outcome::not_found("User does not exist"),
            Err(e) => Outcome::failed(&e),
        }
    }

    pub async fn update_user(&self, req: UpdateUserRequest) -> Outcome<UserView> {
        let patch = UserPatch {
            name: clean(req.name),
            image: clean(req.image),
            bio: req.bio.map(|s| s.trim().to_string()),
        };
        match self.store.update_user(&req.username, patch).await {
            Ok(Some(user)) => Outcome::done("User updated", user_view(&user)),
            Ok(None) => Outcome::not_found("User does not exist"),
            Err(e) => Outcome::failed(&e),
        }
    }

    pub async fn search_users(&self, query: &str) -> Outcome<Vec<UserView>> {
        match self.store.search_users(query, SEARCH_LIMIT).await {
            Ok(users) => Outcome::done("Users found", users.iter().map(user_view).collect()),
            Err(e) => Outcome::failed(&e),
        }
    }

    /// The post stands even when its `CREATE_POST` audit entry cannot be written.
    pub async fn create_post(&self, actor: &Actor, req: CreatePostRequest) -> Outcome<PostView> {
        let title = req.title.trim().to_string();
        if title.is_empty() {
            return Outcome::invalid("Title is required");
        }
        let new_post = NewPost {
            owner_id: actor.id.clone(),
            username: actor.username.clone(),
            post_ref: new_activity_ref(),
            title,
            description: clean(req.description).unwrap_or_default(),
            images: clean_list(req.image),
            tags: clean_list(req.tags),
            people: clean_list(req.people),
            location: clean(req.location).unwrap_or_default(),
        };
        let post = match self.store.insert_post(new_post).await {
            Ok(p) => p,
            Err(e) => return Outcome::failed(&e),
        };
        info!(post_id = %post.id, owner = %post.owner_id, "post created");

        let audit = self.ledger.record_post_created(&post).await;
        if !audit.is_done() {
            warn!(post_id = %post.id, "post created without CREATE_POST entry: {}", audit.message());
        }
        Outcome::done("Post created", post_view(&post))
    }

    pub async fn get_post(&self, post_id: &str) -> Outcome<PostView> {
        match self.store.find_post(post_id).await {
            Ok(Some(post)) => Outcome::done("Post found", post_view(&post)),
            Ok(None) => Outcome::not_found("Post does not exist"),
            Err(e) => Outcome::failed(&e),
        }
    }

    pub async fn list_posts(&self, query: &PageQuery) -> Outcome<Vec<PostView>> {
        self.page_of_posts(None, query).await
    }

    pub async fn list_posts_by_user(&self, user_id: &str, query: &PageQuery) -> Outcome<Vec<PostView>> {
        self.page_of_posts(Some(user_id), query).await
    }

    /// Only the author may edit a post.
    pub async fn update_post(&self, actor: &Actor, post_id: &str, req: UpdatePostRequest) -> Outcome<PostView> {
        match self.store.find_post(post_id).await {
            Ok(Some(post)) if post.owner_id == actor.id => {}
            Ok(Some(_)) => return Outcome::noop("You can only edit your own posts"),
            Ok(None) => return Outcome::not_found("Post does not exist"),
            Err(e) => return Outcome::failed(&e),
        }
        let patch = PostPatch {
            title: clean(req.title),
            description: req.description.map(|s| s.trim().to_string()),
            images: req.image.map(clean_list),
            tags: req.tags.map(clean_list),
            location: req.location.map(|s| s.trim().to_string()),
        };
        match self.store.update_post(post_id, patch).await {
            Ok(Some(post)) => Outcome::done("Post updated", post_view(&post)),
            Ok(None) => Outcome::not_found("Post does not exist"),
            Err(e) => Outcome::failed(&e),
        }
    }

    async fn page_of_posts(&self, owner_id: Option<&str>, query: &PageQuery) -> Outcome<Vec<PostView>> {
        let page = Page::from_query(query, self.default_page_size, self.max_page_size);
        match self.store.list_posts(owner_id, page).await {
            Ok(posts) => Outcome::done("Posts found", posts.iter().map(post_view).collect()),
            Err(e) => Outcome::failed(&e),
        }
    }
}
