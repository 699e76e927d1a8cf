//! Authenticated admin extraction.
//!
//! Session state is never cached: each request resolves its token against
//! the store and gets an explicit principal, or a 401.

use axum::http::{HeaderMap, StatusCode};
use sqlx::PgPool;
use uuid::Uuid;

use super::session::authenticate_session;

/// Authenticated admin context derived from the session token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub admin_id: Uuid,
    pub email: String,
    pub display_name: String,
}

/// Resolve the session token into a principal, or return 401.
pub async fn require_admin(headers: &HeaderMap, pool: &PgPool) -> Result<Principal, StatusCode> {
    match authenticate_session(headers, pool).await {
        Ok(Some(record)) => Ok(Principal {
            admin_id: record.admin_id,
            email: record.email,
            display_name: record.display_name,
        }),
        Ok(None) => Err(StatusCode::UNAUTHORIZED),
        Err(status) => Err(status),
    }
}
