//! Admin session endpoints for cookie and bearer auth.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::storage::{delete_session, find_admin_by_email, insert_session, lookup_session};
use super::types::{AdminLoginRequest, AdminSessionResponse};
use super::utils::{hash_session_token, verify_password};
use crate::api::handlers::state::AppState;
use crate::api::handlers::{normalize_email, ApiMessage};

const SESSION_COOKIE_NAME: &str = "pspk_admin_session";

/// Authenticate an admin and set the session cookie.
#[utoipa::path(
    post,
    path = "/v1/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Session created", body = AdminSessionResponse),
        (status = 400, description = "Missing payload", body = String),
        (status = 401, description = "Invalid credentials", body = ApiMessage)
    ),
    tag = "admin"
)]
pub async fn login(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<AdminLoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    let admin = match find_admin_by_email(&pool, &email).await {
        Ok(admin) => admin,
        Err(err) => {
            error!("Failed to lookup admin: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage::fail("Login failed")),
            )
                .into_response();
        }
    };

    // Same response for unknown email and wrong password.
    let Some(admin) = admin else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiMessage::fail("Invalid email or password")),
        )
            .into_response();
    };
    if !verify_password(&request.password, &admin.password_hash) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiMessage::fail("Invalid email or password")),
        )
            .into_response();
    }

    let token = match insert_session(&pool, admin.id, state.config().session_ttl_seconds()).await {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to create session: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage::fail("Login failed")),
            )
                .into_response();
        }
    };

    let mut headers = HeaderMap::new();
    match session_cookie(&state, &token) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");
        }
    }

    let response = AdminSessionResponse {
        admin_id: admin.id.to_string(),
        email: admin.email,
        display_name: admin.display_name,
    };
    (StatusCode::OK, headers, Json(response)).into_response()
}

/// Report the current admin session, if any.
#[utoipa::path(
    get,
    path = "/v1/admin/session",
    responses(
        (status = 200, description = "Session is active", body = AdminSessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "admin"
)]
pub async fn session(headers: HeaderMap, pool: Extension<PgPool>) -> impl IntoResponse {
    // Missing cookies are treated as "no session" to avoid leaking auth state.
    let Some(token) = extract_session_token(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };
    let token_hash = hash_session_token(&token);
    match lookup_session(&pool, &token_hash).await {
        Ok(Some(record)) => {
            let response = AdminSessionResponse {
                admin_id: record.admin_id.to_string(),
                email: record.email,
                display_name: record.display_name,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("Failed to lookup session: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Clear the admin session.
#[utoipa::path(
    post,
    path = "/v1/admin/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "admin"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    if let Some(token) = extract_session_token(&headers) {
        let token_hash = hash_session_token(&token);
        if let Err(err) = delete_session(&pool, &token_hash).await {
            error!("Failed to delete session: {err}");
        }
    }

    // Always clear the cookie, even if the session record was missing.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(&state) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, response_headers).into_response()
}

/// Resolve a session token into a session record, if present.
///
/// Returns `Ok(None)` when the cookie is missing or invalid.
pub(crate) async fn authenticate_session(
    headers: &HeaderMap,
    pool: &PgPool,
) -> Result<Option<super::storage::SessionRecord>, StatusCode> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };
    let token_hash = hash_session_token(&token);
    match lookup_session(pool, &token_hash).await {
        Ok(record) => Ok(record),
        Err(err) => {
            error!("Failed to lookup session: {err}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Build a secure `HttpOnly` cookie for the session token.
fn session_cookie(state: &AppState, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = state.config().session_ttl_seconds();
    // Only mark cookies secure when the frontend is served over HTTPS.
    let secure = state.config().session_cookie_secure();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(state: &AppState) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = state.config().session_cookie_secure();
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::state::test_state;
    use axum::http::HeaderValue;
    use sqlx::postgres::PgPoolOptions;

    #[test]
    fn extract_session_token_reads_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("other=1; pspk_admin_session=tok; theme=dark"),
        );
        assert_eq!(extract_session_token(&headers), Some("tok".to_string()));
    }

    #[test]
    fn extract_session_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("pspk_admin_session=cookie-token"),
        );
        assert_eq!(extract_session_token(&headers), Some("abc".to_string()));
    }

    #[test]
    fn extract_session_token_none_when_missing() {
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn session_cookie_is_http_only_and_lax() {
        let state = test_state();
        let cookie = session_cookie(&state, "tok").expect("cookie");
        let cookie = cookie.to_str().expect("ascii");
        assert!(cookie.contains("pspk_admin_session=tok"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn login_missing_payload_is_bad_request() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool");
        let response = login(
            Extension(pool),
            Extension(std::sync::Arc::new(test_state())),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn session_without_cookie_is_no_content() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool");
        let response = session(HeaderMap::new(), Extension(pool))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
