//! Public featured-posts listing.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::posts::models::FeaturedPost;
use crate::posts::repo;

#[derive(ToSchema, Serialize, Debug)]
pub struct PostRow {
    pub id: Uuid,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub is_featured: bool,
    pub is_published: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

impl From<FeaturedPost> for PostRow {
    fn from(post: FeaturedPost) -> Self {
        Self {
            id: post.id,
            title: post.title,
            excerpt: post.excerpt,
            content: post.content,
            image_url: post.image_url,
            link_url: post.link_url,
            is_featured: post.is_featured,
            is_published: post.is_published,
            display_order: post.display_order,
            created_at: post.created_at,
        }
    }
}

/// Published posts in display order.
#[utoipa::path(
    get,
    path = "/v1/posts",
    responses(
        (status = 200, description = "Published posts", body = [PostRow])
    ),
    tag = "posts"
)]
pub async fn list_published(pool: Extension<PgPool>) -> impl IntoResponse {
    match repo::list_published(&pool).await {
        Ok(posts) => {
            let rows: Vec<PostRow> = posts.into_iter().map(PostRow::from).collect();
            (StatusCode::OK, Json(rows)).into_response()
        }
        Err(err) => {
            error!("Failed to list published posts: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
