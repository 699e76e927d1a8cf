//! Self-service member endpoints: status check, resignation, data requests.
//!
//! Resignation and data requests are meant to be called after a successful
//! OTP verification for the matching action; the handlers themselves do not
//! re-check OTP state (the code was already consumed by `/v1/otp/verify`).

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::state::AppState;
use super::{normalize_email, valid_email, ApiMessage};
use crate::member::models::DataRequestType;
use crate::member::repo;
use crate::member::service::{self, DataRequestOutcome, ResignOutcome};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MembershipStatusRequest {
    pub id_number: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct MembershipStatusResponse {
    pub success: bool,
    pub found: bool,
    pub verification_status: Option<String>,
    pub membership_number: Option<String>,
    pub first_name: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResignRequest {
    pub email: String,
    pub reason: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct DataRequestBody {
    pub email: String,
    pub request_type: String,
    pub reason: Option<String>,
    pub details: Option<String>,
}

/// Membership status lookup backed by the `check_membership_status`
/// database function.
#[utoipa::path(
    post,
    path = "/v1/member/status",
    request_body = MembershipStatusRequest,
    responses(
        (status = 200, description = "Lookup result", body = MembershipStatusResponse),
        (status = 400, description = "Missing or malformed input", body = String)
    ),
    tag = "member"
)]
pub async fn membership_status(
    pool: Extension<PgPool>,
    payload: Option<Json<MembershipStatusRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let id_number = request.id_number.trim();
    if id_number.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing ID number".to_string()).into_response();
    }

    match repo::membership_status(&pool, id_number).await {
        Ok(status) => {
            let response = MembershipStatusResponse {
                success: true,
                found: status.found,
                verification_status: status.verification_status,
                membership_number: status.membership_number,
                first_name: status.first_name,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => {
            error!("Failed to check membership status: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage::fail("Status check failed. Try again later.")),
            )
                .into_response()
        }
    }
}

/// Process a resignation. Destructive and irreversible: the registration
/// row is deleted after the audit log entry is written.
#[utoipa::path(
    post,
    path = "/v1/member/resign",
    request_body = ResignRequest,
    responses(
        (status = 200, description = "Resignation processed, or no matching registration (soft failure)", body = ApiMessage),
        (status = 400, description = "Missing or malformed input", body = String)
    ),
    tag = "member"
)]
pub async fn resign(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ResignRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }
    let reason = request
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|reason| !reason.is_empty());

    match service::resign(&pool, state.email(), &email, reason).await {
        Ok(ResignOutcome::Resigned) => (
            StatusCode::OK,
            Json(ApiMessage::ok(
                "Your resignation has been processed and your record removed.",
            )),
        )
            .into_response(),
        Ok(ResignOutcome::NotFound) => (
            StatusCode::OK,
            Json(ApiMessage::fail(
                "No registration was found for that email address.",
            )),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to process resignation: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage::fail(
                    "Resignation could not be completed. Try again later.",
                )),
            )
                .into_response()
        }
    }
}

/// Record a data correction/deletion request for manual follow-through
/// (14-day statutory window, communicated to the user, not enforced here).
#[utoipa::path(
    post,
    path = "/v1/member/data-request",
    request_body = DataRequestBody,
    responses(
        (status = 200, description = "Request recorded, or no matching registration (soft failure)", body = ApiMessage),
        (status = 400, description = "Missing or malformed input", body = String)
    ),
    tag = "member"
)]
pub async fn data_request(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<DataRequestBody>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    let Some(request_type) = DataRequestType::parse(&request.request_type) else {
        return (
            StatusCode::BAD_REQUEST,
            "Unrecognized request type".to_string(),
        )
            .into_response();
    };

    // `details` stays optional here even though the web form requires it.
    let reason = request
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let details = request
        .details
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match service::submit_data_request(
        &pool,
        state.email(),
        state.config().admin_email(),
        &email,
        request_type,
        reason,
        details,
    )
    .await
    {
        Ok(DataRequestOutcome::Submitted(_)) => (
            StatusCode::OK,
            Json(ApiMessage::ok(
                "Your request has been received and will be handled within 14 days.",
            )),
        )
            .into_response(),
        Ok(DataRequestOutcome::NotFound) => (
            StatusCode::OK,
            Json(ApiMessage::fail(
                "No registration was found for that email address.",
            )),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to record data request: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage::fail(
                    "Your request could not be recorded. Try again later.",
                )),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::state::test_state;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    #[tokio::test]
    async fn status_missing_payload() {
        let response = membership_status(Extension(lazy_pool()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn status_rejects_blank_id() {
        let response = membership_status(
            Extension(lazy_pool()),
            Some(Json(MembershipStatusRequest {
                id_number: "   ".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn resign_rejects_invalid_email() {
        let response = resign(
            Extension(lazy_pool()),
            Extension(Arc::new(test_state())),
            Some(Json(ResignRequest {
                email: "nope".to_string(),
                reason: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn data_request_rejects_unknown_type() {
        let response = data_request(
            Extension(lazy_pool()),
            Extension(Arc::new(test_state())),
            Some(Json(DataRequestBody {
                email: "a@x.com".to_string(),
                request_type: "resignation".to_string(),
                reason: None,
                details: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
