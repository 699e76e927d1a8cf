//! Database access for featured posts.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

use crate::posts::models::{FeaturedPost, PostDraft};

// Dashboard and public listings share the same ordering.
const ORDERING: &str = "ORDER BY display_order ASC, created_at DESC";

/// Published posts for the public site.
pub async fn list_published(pool: &PgPool) -> Result<Vec<FeaturedPost>> {
    let query = format!("SELECT * FROM featured_posts WHERE is_published {ORDERING}");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    sqlx::query_as::<_, FeaturedPost>(&query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list published posts")
}

/// Every post, drafts included, for the admin dashboard.
pub async fn list_all(pool: &PgPool) -> Result<Vec<FeaturedPost>> {
    let query = format!("SELECT * FROM featured_posts {ORDERING}");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    sqlx::query_as::<_, FeaturedPost>(&query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list posts")
}

pub async fn create(pool: &PgPool, draft: &PostDraft) -> Result<FeaturedPost> {
    let query = r"
        INSERT INTO featured_posts
            (title, excerpt, content, image_url, link_url, is_featured, is_published, display_order)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query_as::<_, FeaturedPost>(query)
        .bind(&draft.title)
        .bind(&draft.excerpt)
        .bind(&draft.content)
        .bind(&draft.image_url)
        .bind(&draft.link_url)
        .bind(draft.is_featured)
        .bind(draft.is_published)
        .bind(draft.display_order)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to create post")
}

/// Replace a post's fields. Returns the updated row, or `None` when the id
/// is unknown.
pub async fn update(pool: &PgPool, id: Uuid, draft: &PostDraft) -> Result<Option<FeaturedPost>> {
    let query = r"
        UPDATE featured_posts
        SET title = $2,
            excerpt = $3,
            content = $4,
            image_url = $5,
            link_url = $6,
            is_featured = $7,
            is_published = $8,
            display_order = $9,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query_as::<_, FeaturedPost>(query)
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.excerpt)
        .bind(&draft.content)
        .bind(&draft.image_url)
        .bind(&draft.link_url)
        .bind(draft.is_featured)
        .bind(draft.is_published)
        .bind(draft.display_order)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update post")
}

/// Delete a post. Returns `false` when no row matched.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
    let query = "DELETE FROM featured_posts WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete post")?;
    Ok(result.rows_affected() > 0)
}
