//! One-time code endpoints.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::state::AppState;
use super::{normalize_email, valid_email, ApiMessage};
use crate::member::models::MemberSnapshot;
use crate::otp::models::ActionType;
use crate::otp::service::{self, IssueOutcome, VerifyOutcome};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct IssueOtpRequest {
    pub email: String,
    pub id_number: String,
    pub action_type: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
    pub action_type: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct MemberStatusBody {
    pub first_name: String,
    pub last_name: String,
    pub verification_status: String,
    pub membership_number: Option<String>,
}

impl From<MemberSnapshot> for MemberStatusBody {
    fn from(snapshot: MemberSnapshot) -> Self {
        Self {
            first_name: snapshot.first_name,
            last_name: snapshot.last_name,
            verification_status: snapshot.verification_status.as_str().to_string(),
            membership_number: snapshot.membership_number,
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub verified: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberStatusBody>,
}

/// Issue a one-time code for a self-service action.
#[utoipa::path(
    post,
    path = "/v1/otp/issue",
    request_body = IssueOtpRequest,
    responses(
        (status = 200, description = "Code issued, or no matching registration (soft failure)", body = ApiMessage),
        (status = 400, description = "Missing or malformed input", body = String)
    ),
    tag = "otp"
)]
pub async fn issue_otp(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<IssueOtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    let id_number = request.id_number.trim();
    if id_number.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing ID number".to_string()).into_response();
    }

    let Some(action) = ActionType::parse(&request.action_type) else {
        return (
            StatusCode::BAD_REQUEST,
            "Unrecognized action type".to_string(),
        )
            .into_response();
    };

    match service::issue(
        &pool,
        state.email(),
        &email,
        id_number,
        action,
        state.config().otp_ttl_minutes(),
    )
    .await
    {
        Ok(IssueOutcome::Issued) => (
            StatusCode::OK,
            Json(ApiMessage::ok(
                "A verification code has been sent to your email address.",
            )),
        )
            .into_response(),
        Ok(IssueOutcome::NotRegistered) => (
            StatusCode::OK,
            Json(ApiMessage::fail(
                "No registration matches those details. Please register first.",
            )),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to issue otp: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage::fail("Could not issue a code. Try again later.")),
            )
                .into_response()
        }
    }
}

/// Verify and consume a one-time code.
#[utoipa::path(
    post,
    path = "/v1/otp/verify",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Verification result", body = VerifyOtpResponse),
        (status = 400, description = "Missing or malformed input", body = String)
    ),
    tag = "otp"
)]
pub async fn verify_otp(
    pool: Extension<PgPool>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    let code = request.code.trim();
    if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return (StatusCode::BAD_REQUEST, "Invalid code".to_string()).into_response();
    }

    let Some(action) = ActionType::parse(&request.action_type) else {
        return (
            StatusCode::BAD_REQUEST,
            "Unrecognized action type".to_string(),
        )
            .into_response();
    };

    match service::verify(&pool, &email, code, action).await {
        Ok(VerifyOutcome::Verified(snapshot)) => {
            let response = VerifyOtpResponse {
                success: true,
                verified: true,
                message: "Code verified.".to_string(),
                member: snapshot.map(MemberStatusBody::from),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(VerifyOutcome::InvalidOrExpired) => {
            let response = VerifyOtpResponse {
                success: false,
                verified: false,
                message: "Invalid or expired code. Request a new one and try again.".to_string(),
                member: None,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => {
            error!("Failed to verify otp: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage::fail("Verification failed. Try again later.")),
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
    async fn issue_missing_payload() {
        let response = issue_otp(
            Extension(lazy_pool()),
            Extension(Arc::new(test_state())),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn issue_rejects_invalid_email() {
        let response = issue_otp(
            Extension(lazy_pool()),
            Extension(Arc::new(test_state())),
            Some(Json(IssueOtpRequest {
                email: "not-an-email".to_string(),
                id_number: "12345678".to_string(),
                action_type: "resignation".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn issue_rejects_unknown_action() {
        let response = issue_otp(
            Extension(lazy_pool()),
            Extension(Arc::new(test_state())),
            Some(Json(IssueOtpRequest {
                email: "a@x.com".to_string(),
                id_number: "12345678".to_string(),
                action_type: "login".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verify_rejects_short_code() {
        let response = verify_otp(
            Extension(lazy_pool()),
            Some(Json(VerifyOtpRequest {
                email: "a@x.com".to_string(),
                code: "123".to_string(),
                action_type: "membership_check".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verify_rejects_non_numeric_code() {
        let response = verify_otp(
            Extension(lazy_pool()),
            Some(Json(VerifyOtpRequest {
                email: "a@x.com".to_string(),
                code: "12345a".to_string(),
                action_type: "membership_check".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn member_status_body_from_snapshot() {
        use crate::member::models::{MemberSnapshot, VerificationStatus};
        let body = MemberStatusBody::from(MemberSnapshot {
            first_name: "Amina".to_string(),
            last_name: "Odhiambo".to_string(),
            verification_status: VerificationStatus::Approved,
            membership_number: Some("PSP-K-2025-00001".to_string()),
        });
        assert_eq!(body.verification_status, "approved");
        assert_eq!(body.membership_number.as_deref(), Some("PSP-K-2025-00001"));
    }
}
