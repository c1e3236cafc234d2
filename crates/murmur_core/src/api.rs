/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::activity::ActivityRecord;
use crate::ledger::Actor;
use crate::outcome::Outcome;
use crate::views::record_view;
use crate::Engine;
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, HeaderValue, StatusCode},
    middleware::{from_fn, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use murmur_protocol::{
    ApiResponse, CommentRequest, CreatePostRequest, CreateUserRequest, LikeRequest, PageQuery, UpdatePostRequest,
    UpdateUserRequest,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tower_http::trace::TraceLayer;
use tracing::info_span;

static REQ_ID: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> String {
    let id = REQ_ID.fetch_add(1, Ordering::Relaxed);
    format!("req-{id}")
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
}

/// Caller identity taken from the session headers set by the auth proxy.
pub struct SessionActor(pub Actor);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionActor {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let (Some(id), Some(username)) = (header("x-user-id"), header("x-username")) else {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::<()>::message("You are not logged in")),
            )
                .into_response());
        };
        Ok(Self(Actor::new(id, username).with_image(header("x-user-image"))))
    }
}

fn reply<T: Serialize>(out: Outcome<T>) -> Response {
    let status = match &out {
        Outcome::Done { .. } | Outcome::Noop(_) => StatusCode::OK,
        Outcome::NotFound(_) => StatusCode::NOT_FOUND,
        Outcome::Invalid(_) => StatusCode::BAD_REQUEST,
        Outcome::Failed(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(out.into_response())).into_response()
}

fn reply_record(out: Outcome<ActivityRecord>) -> Response {
    reply(out.map(|r| record_view(&r)))
}

pub fn router(engine: Engine, max_body_bytes: usize) -> Router {
    let state = AppState { engine };
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/user", post(create_user).get(get_user).put(update_user))
        .route("/api/user/search", get(search_users))
        .route("/api/posts", get(list_posts).post(create_post))
        .route("/api/posts/user/:user_id", get(list_posts_by_user))
        .route("/api/posts/:id", get(get_post).put(update_post))
        .route("/api/posts/:id/like", post(like_post))
        .route("/api/posts/:id/likes", get(list_likers))
        .route("/api/posts/:id/liked", get(check_liked))
        .route("/api/posts/:id/likes/drift", get(like_drift))
        .route("/api/posts/:id/likes/reconcile", post(reconcile_likes))
        .route("/api/posts/:id/comments", get(list_comments).post(add_comment))
        .route("/api/activity/like/:activity_id", delete(remove_like))
        .route("/api/activity/comment/:activity_id", put(edit_comment).delete(remove_comment))
        .route("/api/activity/feed", get(activity_feed))
        .route("/api/activity/notifications", get(notifications))
        .route("/api/activity/inbox", get(notification_inbox))
        .route("/api/follow/:user_id", post(follow).delete(unfollow).get(check_following))
        .route("/api/following", get(following))
        .route("/api/followers", get(followers))
        .layer(axum::extract::DefaultBodyLimit::max(max_body_bytes))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let request_id = req
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("req");
                let user_id = req.headers().get("x-user-id").and_then(|v| v.to_str().ok());
                info_span!(
                    "http",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id,
                    user_id = ?user_id
                )
            }),
        )
        .layer(from_fn(ensure_request_id))
        .with_state(state)
}

async fn ensure_request_id(mut req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    if req.headers().get("x-request-id").is_none() {
        let request_id = next_request_id();
        req.headers_mut().insert(
            "x-request-id",
            HeaderValue::from_str(&request_id).unwrap_or_else(|_| HeaderValue::from_static("req")),
        );
    }
    next.run(req).await
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.store().health_check().await {
        Ok(()) => (StatusCode::OK, "ready").into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "db not ready").into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct UsernameQuery {
    #[serde(default)]
    username: String,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn create_user(State(state): State<AppState>, Json(req): Json<CreateUserRequest>) -> Response {
    reply(state.engine.directory.create_user(req).await)
}

async fn get_user(State(state): State<AppState>, Query(q): Query<UsernameQuery>) -> Response {
    reply(state.engine.directory.get_user(&q.username).await)
}

async fn update_user(
    State(state): State<AppState>,
    SessionActor(actor): SessionActor,
    Json(req): Json<UpdateUserRequest>,
) -> Response {
    if req.username.trim() != actor.username {
        return reply(Outcome::<()>::noop("You can only edit your own profile"));
    }
    reply(state.engine.directory.update_user(req).await)
}

async fn search_users(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> Response {
    reply(state.engine.directory.search_users(&q.q).await)
}

async fn list_posts(State(state): State<AppState>, Query(page): Query<PageQuery>) -> Response {
    reply(state.engine.directory.list_posts(&page).await)
}

async fn list_posts_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Response {
    reply(state.engine.directory.list_posts_by_user(&user_id, &page).await)
}

async fn create_post(
    State(state): State<AppState>,
    SessionActor(actor): SessionActor,
    Json(req): Json<CreatePostRequest>,
) -> Response {
    reply(state.engine.directory.create_post(&actor, req).await)
}

async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    reply(state.engine.directory.get_post(&id).await)
}

async fn update_post(
    State(state): State<AppState>,
    SessionActor(actor): SessionActor,
    Path(id): Path<String>,
    Json(req): Json<UpdatePostRequest>,
) -> Response {
    reply(state.engine.directory.update_post(&actor, &id, req).await)
}

async fn like_post(
    State(state): State<AppState>,
    SessionActor(actor): SessionActor,
    Path(id): Path<String>,
    body: Option<Json<LikeRequest>>,
) -> Response {
    let actor = match body.and_then(|Json(b)| b.user_image) {
        Some(image) => actor.with_image(Some(image)),
        None => actor,
    };
    reply_record(state.engine.ledger.record_like(&actor, &id).await)
}

async fn remove_like(
    State(state): State<AppState>,
    SessionActor(actor): SessionActor,
    Path(activity_id): Path<String>,
) -> Response {
    reply_record(state.engine.ledger.record_unlike(&activity_id, &actor).await)
}

async fn list_likers(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    reply(state.engine.feed.likers(&id).await)
}

async fn check_liked(
    State(state): State<AppState>,
    SessionActor(actor): SessionActor,
    Path(id): Path<String>,
) -> Response {
    reply(state.engine.feed.is_liked(&actor.id, &id).await)
}

async fn like_drift(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    reply(state.engine.likes().like_drift(&id).await)
}

async fn reconcile_likes(
    State(state): State<AppState>,
    SessionActor(_actor): SessionActor,
    Path(id): Path<String>,
) -> Response {
    reply(state.engine.likes().reconcile_likes(&id).await)
}

async fn add_comment(
    State(state): State<AppState>,
    SessionActor(actor): SessionActor,
    Path(id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Response {
    let actor = match req.user_image {
        Some(image) => actor.with_image(Some(image)),
        None => actor,
    };
    reply_record(state.engine.ledger.record_comment(&actor, &id, &req.message).await)
}

async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Response {
    reply(state.engine.feed.comments(&id, &page).await)
}

async fn edit_comment(
    State(state): State<AppState>,
    SessionActor(actor): SessionActor,
    Path(activity_id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Response {
    reply_record(state.engine.ledger.edit_comment(&activity_id, &actor, &req.message).await)
}

async fn remove_comment(
    State(state): State<AppState>,
    SessionActor(actor): SessionActor,
    Path(activity_id): Path<String>,
) -> Response {
    reply_record(state.engine.ledger.record_uncomment(&activity_id, &actor).await)
}

async fn activity_feed(State(state): State<AppState>, SessionActor(actor): SessionActor) -> Response {
    reply(state.engine.feed.activity_feed(&actor.id).await)
}

async fn notifications(State(state): State<AppState>, SessionActor(actor): SessionActor) -> Response {
    reply(state.engine.feed.notifications(&actor.id).await)
}

async fn notification_inbox(State(state): State<AppState>, SessionActor(actor): SessionActor) -> Response {
    reply(state.engine.feed.notification_inbox(&actor.id).await)
}

async fn follow(
    State(state): State<AppState>,
    SessionActor(actor): SessionActor,
    Path(user_id): Path<String>,
) -> Response {
    reply_record(state.engine.ledger.record_follow(&actor, &user_id).await)
}

async fn unfollow(
    State(state): State<AppState>,
    SessionActor(actor): SessionActor,
    Path(user_id): Path<String>,
) -> Response {
    reply_record(state.engine.ledger.record_unfollow(&actor, &user_id).await)
}

async fn check_following(
    State(state): State<AppState>,
    SessionActor(actor): SessionActor,
    Path(user_id): Path<String>,
) -> Response {
    reply(state.engine.feed.is_following(&actor.id, &user_id).await)
}

async fn following(State(state): State<AppState>, SessionActor(actor): SessionActor) -> Response {
    reply(state.engine.feed.following(&actor.id).await)
}

async fn followers(State(state): State<AppState>, SessionActor(actor): SessionActor) -> Response {
    reply(state.engine.feed.followers(&actor.id).await)
}
