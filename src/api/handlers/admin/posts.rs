//! Featured-posts management for the dashboard.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::handlers::auth::require_admin;
use crate::api::handlers::posts::PostRow;
use crate::api::handlers::ApiMessage;
use crate::posts::models::PostDraft;
use crate::posts::repo;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PostPayload {
    pub title: String,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub display_order: i32,
}

fn draft_from_payload(payload: PostPayload) -> Result<PostDraft, String> {
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err("Title is required".to_string());
    }

    let clean = |value: Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    Ok(PostDraft {
        title,
        excerpt: clean(payload.excerpt),
        content: clean(payload.content),
        image_url: clean(payload.image_url),
        link_url: clean(payload.link_url),
        is_featured: payload.is_featured,
        is_published: payload.is_published,
        display_order: payload.display_order,
    })
}

/// Every post, drafts included.
#[utoipa::path(
    get,
    path = "/v1/admin/posts",
    responses(
        (status = 200, description = "All posts", body = [PostRow]),
        (status = 401, description = "Missing admin session")
    ),
    tag = "admin"
)]
pub async fn list(headers: HeaderMap, pool: Extension<PgPool>) -> impl IntoResponse {
    if let Err(status) = require_admin(&headers, &pool).await {
        return status.into_response();
    }

    match repo::list_all(&pool).await {
        Ok(posts) => {
            let rows: Vec<PostRow> = posts.into_iter().map(PostRow::from).collect();
            (StatusCode::OK, Json(rows)).into_response()
        }
        Err(err) => {
            error!("Failed to list posts: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Create a post.
#[utoipa::path(
    post,
    path = "/v1/admin/posts",
    request_body = PostPayload,
    responses(
        (status = 201, description = "Post created", body = PostRow),
        (status = 400, description = "Invalid payload", body = String),
        (status = 401, description = "Missing admin session")
    ),
    tag = "admin"
)]
pub async fn create(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    payload: Option<Json<PostPayload>>,
) -> impl IntoResponse {
    if let Err(status) = require_admin(&headers, &pool).await {
        return status.into_response();
    }

    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let draft = match draft_from_payload(payload) {
        Ok(draft) => draft,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };

    match repo::create(&pool, &draft).await {
        Ok(post) => (StatusCode::CREATED, Json(PostRow::from(post))).into_response(),
        Err(err) => {
            error!("Failed to create post: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Replace a post.
#[utoipa::path(
    put,
    path = "/v1/admin/posts/{id}",
    params(
        ("id" = Uuid, Path, description = "Post id")
    ),
    request_body = PostPayload,
    responses(
        (status = 200, description = "Post updated", body = PostRow),
        (status = 400, description = "Invalid payload", body = String),
        (status = 401, description = "Missing admin session"),
        (status = 404, description = "Unknown post", body = ApiMessage)
    ),
    tag = "admin"
)]
pub async fn update(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    Path(id): Path<Uuid>,
    payload: Option<Json<PostPayload>>,
) -> impl IntoResponse {
    if let Err(status) = require_admin(&headers, &pool).await {
        return status.into_response();
    }

    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let draft = match draft_from_payload(payload) {
        Ok(draft) => draft,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };

    match repo::update(&pool, id, &draft).await {
        Ok(Some(post)) => (StatusCode::OK, Json(PostRow::from(post))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiMessage::fail("No post with that id.")),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to update post: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Delete a post.
#[utoipa::path(
    delete,
    path = "/v1/admin/posts/{id}",
    params(
        ("id" = Uuid, Path, description = "Post id")
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Missing admin session"),
        (status = 404, description = "Unknown post", body = ApiMessage)
    ),
    tag = "admin"
)]
pub async fn delete(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(status) = require_admin(&headers, &pool).await {
        return status.into_response();
    }

    match repo::delete(&pool, id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ApiMessage::fail("No post with that id.")),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to delete post: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_requires_title() {
        let payload = PostPayload {
            title: "  ".to_string(),
            excerpt: None,
            content: None,
            image_url: None,
            link_url: None,
            is_featured: false,
            is_published: false,
            display_order: 0,
        };
        assert!(draft_from_payload(payload).is_err());
    }

    #[test]
    fn draft_blanks_empty_optionals() {
        let payload = PostPayload {
            title: "Manifesto launch".to_string(),
            excerpt: Some("  ".to_string()),
            content: Some("Full text".to_string()),
            image_url: None,
            link_url: Some("https://pspk.or.ke/manifesto".to_string()),
            is_featured: true,
            is_published: false,
            display_order: 2,
        };
        let draft = draft_from_payload(payload).expect("valid");
        assert_eq!(draft.excerpt, None);
        assert_eq!(draft.content.as_deref(), Some("Full text"));
        assert_eq!(draft.display_order, 2);
    }

    #[test]
    fn payload_defaults_apply() {
        let payload: PostPayload =
            serde_json::from_value(serde_json::json!({"title": "Launch"})).expect("parse");
        assert!(!payload.is_featured);
        assert!(!payload.is_published);
        assert_eq!(payload.display_order, 0);
    }
}
