//! Registrations review: listing and the approve/reject transition.

use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::handlers::auth::require_admin;
use crate::api::handlers::state::AppState;
use crate::api::handlers::ApiMessage;
use crate::member::models::{Registration, VerificationStatus};
use crate::member::repo;
use crate::member::service::{self, VerifyDecision, VerifyMemberOutcome};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(IntoParams, Deserialize, Debug)]
pub struct ListQuery {
    /// Filter by verification status (`pending`, `approved`, `rejected`).
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct RegistrationRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub id_number: String,
    pub county: String,
    pub constituency: String,
    pub ward: String,
    pub special_interest_groups: Vec<String>,
    pub verification_status: String,
    pub membership_number: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Registration> for RegistrationRow {
    fn from(registration: Registration) -> Self {
        Self {
            id: registration.id,
            first_name: registration.first_name,
            last_name: registration.last_name,
            email: registration.email,
            phone: registration.phone,
            id_number: registration.id_number,
            county: registration.county,
            constituency: registration.constituency,
            ward: registration.ward,
            special_interest_groups: registration.special_interest_groups,
            verification_status: registration.verification_status.as_str().to_string(),
            membership_number: registration.membership_number,
            rejection_reason: registration.rejection_reason,
            created_at: registration.created_at,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyMemberRequest {
    /// `approve` or `reject`.
    pub action: String,
    /// Required when rejecting.
    pub reason: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct VerifyMemberResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_number: Option<String>,
}

/// Read-only registrations listing for the dashboard.
#[utoipa::path(
    get,
    path = "/v1/admin/registrations",
    params(ListQuery),
    responses(
        (status = 200, description = "Registrations", body = [RegistrationRow]),
        (status = 400, description = "Invalid status filter", body = String),
        (status = 401, description = "Missing admin session")
    ),
    tag = "admin"
)]
pub async fn list(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    query: Query<ListQuery>,
) -> impl IntoResponse {
    if let Err(status) = require_admin(&headers, &pool).await {
        return status.into_response();
    }

    let status = match query.status.as_deref() {
        None => None,
        Some(value) => match VerificationStatus::parse(value) {
            Some(status) => Some(status),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    "Invalid status filter".to_string(),
                )
                    .into_response()
            }
        },
    };

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    match repo::list_registrations(&pool, status, limit, offset).await {
        Ok(rows) => {
            let rows: Vec<RegistrationRow> = rows.into_iter().map(RegistrationRow::from).collect();
            (StatusCode::OK, Json(rows)).into_response()
        }
        Err(err) => {
            error!("Failed to list registrations: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Approve or reject a pending registration. Approval allocates the
/// year-sequential membership number; both branches are terminal.
#[utoipa::path(
    post,
    path = "/v1/admin/registrations/{id}/verify",
    params(
        ("id" = Uuid, Path, description = "Registration id")
    ),
    request_body = VerifyMemberRequest,
    responses(
        (status = 200, description = "Decision applied, or soft failure", body = VerifyMemberResponse),
        (status = 400, description = "Invalid action or missing rejection reason", body = String),
        (status = 401, description = "Missing admin session")
    ),
    tag = "admin"
)]
pub async fn verify(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Option<Json<VerifyMemberRequest>>,
) -> impl IntoResponse {
    if let Err(status) = require_admin(&headers, &pool).await {
        return status.into_response();
    }

    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let decision = match request.action.as_str() {
        "approve" => VerifyDecision::Approve,
        "reject" => {
            let reason = request
                .reason
                .as_deref()
                .map(str::trim)
                .filter(|reason| !reason.is_empty());
            match reason {
                Some(reason) => VerifyDecision::Reject {
                    reason: reason.to_string(),
                },
                None => {
                    return (
                        StatusCode::BAD_REQUEST,
                        "Rejection reason is required".to_string(),
                    )
                        .into_response()
                }
            }
        }
        _ => return (StatusCode::BAD_REQUEST, "Invalid action".to_string()).into_response(),
    };

    match service::verify_member(&pool, state.email(), id, decision).await {
        Ok(VerifyMemberOutcome::Approved { membership_number }) => {
            let response = VerifyMemberResponse {
                success: true,
                message: format!("Member approved with number {membership_number}."),
                membership_number: Some(membership_number),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(VerifyMemberOutcome::Rejected) => {
            let response = VerifyMemberResponse {
                success: true,
                message: "Registration rejected.".to_string(),
                membership_number: None,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(VerifyMemberOutcome::NotFound) => (
            StatusCode::OK,
            Json(ApiMessage::fail("No registration with that id.")),
        )
            .into_response(),
        Ok(VerifyMemberOutcome::AlreadyProcessed) => (
            StatusCode::OK,
            Json(ApiMessage::fail(
                "This registration has already been processed.",
            )),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to verify member: {err}");
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
    async fn list_requires_session() {
        let response = list(
            HeaderMap::new(),
            Extension(lazy_pool()),
            Query(ListQuery {
                status: None,
                limit: None,
                offset: None,
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn verify_requires_session() {
        let response = verify(
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(Arc::new(test_state())),
            Path(Uuid::nil()),
            Some(Json(VerifyMemberRequest {
                action: "approve".to_string(),
                reason: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn registration_row_maps_status_text() {
        use crate::member::models::VerificationStatus;
        use chrono::NaiveDate;
        let registration = Registration {
            id: Uuid::nil(),
            first_name: "Amina".to_string(),
            last_name: "Odhiambo".to_string(),
            email: "a@x.com".to_string(),
            phone: "0712345678".to_string(),
            id_number: "12345678".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12).expect("date"),
            gender: "female".to_string(),
            county: "Nairobi".to_string(),
            constituency: "Westlands".to_string(),
            ward: "Parklands".to_string(),
            disability_status: None,
            special_interest_groups: vec!["women".to_string()],
            privacy_consent: true,
            terms_consent: true,
            verification_status: VerificationStatus::Pending,
            membership_number: None,
            rejection_reason: None,
            verified_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let row = RegistrationRow::from(registration);
        assert_eq!(row.verification_status, "pending");
    }
}
