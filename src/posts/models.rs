use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

/// Marketing content entity managed through the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct FeaturedPost {
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
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for FeaturedPost {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            excerpt: row.try_get("excerpt")?,
            content: row.try_get("content")?,
            image_url: row.try_get("image_url")?,
            link_url: row.try_get("link_url")?,
            is_featured: row.try_get("is_featured")?,
            is_published: row.try_get("is_published")?,
            display_order: row.try_get("display_order")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Fields accepted when creating or replacing a post.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub is_featured: bool,
    pub is_published: bool,
    pub display_order: i32,
}
