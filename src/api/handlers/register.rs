//! Registration intake.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::state::AppState;
use super::{normalize_email, valid_email, valid_id_number, valid_phone, ApiMessage};
use crate::member::models::NewRegistration;
use crate::member::service::{self, RegisterOutcome};

/// Self-declared demographic tags a registrant may attach.
const RECOGNIZED_SIGS: &[&str] = &["youth", "women", "pwd", "elderly", "diaspora"];

const RECOGNIZED_GENDERS: &[&str] = &["female", "male", "other", "prefer_not_to_say"];

const MINIMUM_AGE_YEARS: i32 = 18;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub id_number: String,
    /// ISO date, `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub gender: String,
    pub county: String,
    pub constituency: String,
    pub ward: String,
    pub disability_status: Option<String>,
    #[serde(default)]
    pub special_interest_groups: Vec<String>,
    #[serde(default)]
    pub privacy_consent: bool,
    #[serde(default)]
    pub terms_consent: bool,
}

/// Validate the payload into a `NewRegistration`, or explain what is wrong.
fn validate(request: RegisterRequest) -> Result<NewRegistration, String> {
    let first_name = request.first_name.trim().to_string();
    let last_name = request.last_name.trim().to_string();
    if first_name.is_empty() || last_name.is_empty() {
        return Err("First and last name are required".to_string());
    }

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err("Invalid email".to_string());
    }

    let phone = request.phone.trim().to_string();
    if !valid_phone(&phone) {
        return Err("Invalid phone number".to_string());
    }

    let id_number = request.id_number.trim().to_string();
    if !valid_id_number(&id_number) {
        return Err("Invalid national ID number".to_string());
    }

    let date_of_birth = NaiveDate::parse_from_str(request.date_of_birth.trim(), "%Y-%m-%d")
        .map_err(|_| "Invalid date of birth, expected YYYY-MM-DD".to_string())?;
    let today = Utc::now().date_naive();
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    if age < MINIMUM_AGE_YEARS {
        return Err("Registrants must be at least 18 years old".to_string());
    }

    let gender = request.gender.trim().to_lowercase();
    if !RECOGNIZED_GENDERS.contains(&gender.as_str()) {
        return Err("Unrecognized gender".to_string());
    }

    let county = request.county.trim().to_string();
    let constituency = request.constituency.trim().to_string();
    let ward = request.ward.trim().to_string();
    if county.is_empty() || constituency.is_empty() || ward.is_empty() {
        return Err("County, constituency and ward are required".to_string());
    }

    let mut special_interest_groups = Vec::with_capacity(request.special_interest_groups.len());
    for tag in &request.special_interest_groups {
        let tag = tag.trim().to_lowercase();
        if !RECOGNIZED_SIGS.contains(&tag.as_str()) {
            return Err(format!("Unrecognized special interest group: {tag}"));
        }
        if !special_interest_groups.contains(&tag) {
            special_interest_groups.push(tag);
        }
    }

    if !request.privacy_consent || !request.terms_consent {
        return Err("Privacy and terms consent are required".to_string());
    }

    let disability_status = request
        .disability_status
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    Ok(NewRegistration {
        first_name,
        last_name,
        email,
        phone,
        id_number,
        date_of_birth,
        gender,
        county,
        constituency,
        ward,
        disability_status,
        special_interest_groups,
        privacy_consent: request.privacy_consent,
        terms_consent: request.terms_consent,
    })
}

/// Register a new member. The registration starts as `pending` and waits
/// for admin verification.
#[utoipa::path(
    post,
    path = "/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration created", body = ApiMessage),
        (status = 400, description = "Missing or malformed input", body = String),
        (status = 409, description = "Email or national ID already registered", body = ApiMessage)
    ),
    tag = "register"
)]
pub async fn register(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let new = match validate(request) {
        Ok(new) => new,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };

    match service::register(&pool, state.email(), new).await {
        Ok(RegisterOutcome::Created(_)) => (
            StatusCode::CREATED,
            Json(ApiMessage::ok(
                "Registration received. You will be notified once it has been reviewed.",
            )),
        )
            .into_response(),
        Ok(RegisterOutcome::Conflict) => (
            StatusCode::CONFLICT,
            Json(ApiMessage::fail(
                "A registration with this email or national ID already exists.",
            )),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to create registration: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage::fail("Registration failed. Try again later.")),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> RegisterRequest {
        RegisterRequest {
            first_name: "Amina".to_string(),
            last_name: "Odhiambo".to_string(),
            email: "Amina@Example.com".to_string(),
            phone: "+254712345678".to_string(),
            id_number: "12345678".to_string(),
            date_of_birth: "1990-04-12".to_string(),
            gender: "female".to_string(),
            county: "Nairobi".to_string(),
            constituency: "Westlands".to_string(),
            ward: "Parklands".to_string(),
            disability_status: None,
            special_interest_groups: vec!["women".to_string()],
            privacy_consent: true,
            terms_consent: true,
        }
    }

    #[test]
    fn validate_accepts_and_normalizes() {
        let new = validate(valid_request()).expect("valid");
        assert_eq!(new.email, "amina@example.com");
        assert_eq!(new.special_interest_groups, vec!["women".to_string()]);
    }

    #[test]
    fn validate_rejects_unknown_sig() {
        let mut request = valid_request();
        request.special_interest_groups = vec!["cyclists".to_string()];
        let err = validate(request).expect_err("invalid");
        assert!(err.contains("special interest group"));
    }

    #[test]
    fn validate_rejects_missing_consent() {
        let mut request = valid_request();
        request.terms_consent = false;
        assert!(validate(request).is_err());
    }

    #[test]
    fn validate_rejects_bad_date() {
        let mut request = valid_request();
        request.date_of_birth = "12/04/1990".to_string();
        let err = validate(request).expect_err("invalid");
        assert!(err.contains("date of birth"));
    }

    #[test]
    fn validate_rejects_minors() {
        let mut request = valid_request();
        let today = Utc::now().date_naive();
        request.date_of_birth = format!("{}-01-01", today.year() - 10);
        let err = validate(request).expect_err("invalid");
        assert!(err.contains("18"));
    }

    #[test]
    fn validate_rejects_bad_id_number() {
        let mut request = valid_request();
        request.id_number = "12ab".to_string();
        assert!(validate(request).is_err());
    }

    #[test]
    fn validate_deduplicates_sigs() {
        let mut request = valid_request();
        request.special_interest_groups =
            vec!["women".to_string(), "Women".to_string(), "youth".to_string()];
        let new = validate(request).expect("valid");
        assert_eq!(
            new.special_interest_groups,
            vec!["women".to_string(), "youth".to_string()]
        );
    }
}
