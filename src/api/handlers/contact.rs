//! Contact-form and volunteer intake.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, Instrument};
use utoipa::ToSchema;

use super::state::AppState;
use super::{normalize_email, valid_email, valid_phone, ApiMessage};
use crate::api::email::messages;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VolunteerRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub county: String,
    pub availability: Option<String>,
}

/// Store a contact message and alert the configured admin address.
#[utoipa::path(
    post,
    path = "/v1/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message recorded", body = ApiMessage),
        (status = 400, description = "Missing or malformed input", body = String)
    ),
    tag = "contact"
)]
pub async fn contact(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ContactRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let name = request.name.trim();
    let message = request.message.trim();
    if name.is_empty() || message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "Name and message are required".to_string(),
        )
            .into_response();
    }
    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }
    let subject = request
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|subject| !subject.is_empty());

    if let Err(err) = insert_contact(&pool, name, &email, subject, message).await {
        error!("Failed to store contact message: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiMessage::fail(
                "Your message could not be recorded. Try again later.",
            )),
        )
            .into_response();
    }

    state
        .email()
        .send_best_effort(messages::contact_alert(
            state.config().admin_email(),
            name,
            &email,
            subject,
            message,
        ))
        .await;

    (
        StatusCode::OK,
        Json(ApiMessage::ok("Thank you, your message has been received.")),
    )
        .into_response()
}

/// Store a volunteer signup and acknowledge it.
#[utoipa::path(
    post,
    path = "/v1/volunteer",
    request_body = VolunteerRequest,
    responses(
        (status = 200, description = "Signup recorded", body = ApiMessage),
        (status = 400, description = "Missing or malformed input", body = String)
    ),
    tag = "contact"
)]
pub async fn volunteer(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<VolunteerRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let name = request.name.trim();
    let county = request.county.trim();
    if name.is_empty() || county.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "Name and county are required".to_string(),
        )
            .into_response();
    }
    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }
    let phone = request.phone.trim();
    if !valid_phone(phone) {
        return (StatusCode::BAD_REQUEST, "Invalid phone number".to_string()).into_response();
    }
    let availability = request
        .availability
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    if let Err(err) = insert_volunteer(&pool, name, &email, phone, county, availability).await {
        error!("Failed to store volunteer signup: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiMessage::fail(
                "Your signup could not be recorded. Try again later.",
            )),
        )
            .into_response();
    }

    state
        .email()
        .send_best_effort(messages::volunteer_ack(&email, name))
        .await;

    (
        StatusCode::OK,
        Json(ApiMessage::ok("Thank you for signing up to volunteer.")),
    )
        .into_response()
}

async fn insert_contact(
    pool: &PgPool,
    name: &str,
    email: &str,
    subject: Option<&str>,
    message: &str,
) -> Result<(), sqlx::Error> {
    let query = "INSERT INTO contacts (name, email, subject, message) VALUES ($1, $2, $3, $4)";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(name)
        .bind(email)
        .bind(subject)
        .bind(message)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(())
}

async fn insert_volunteer(
    pool: &PgPool,
    name: &str,
    email: &str,
    phone: &str,
    county: &str,
    availability: Option<&str>,
) -> Result<(), sqlx::Error> {
    let query = r"
        INSERT INTO volunteers (name, email, phone, county, availability)
        VALUES ($1, $2, $3, $4, $5)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(county)
        .bind(availability)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(())
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
    async fn contact_missing_payload() {
        let response = contact(Extension(lazy_pool()), Extension(Arc::new(test_state())), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn contact_rejects_blank_message() {
        let response = contact(
            Extension(lazy_pool()),
            Extension(Arc::new(test_state())),
            Some(Json(ContactRequest {
                name: "Amina".to_string(),
                email: "a@x.com".to_string(),
                subject: None,
                message: "   ".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn volunteer_rejects_bad_phone() {
        let response = volunteer(
            Extension(lazy_pool()),
            Extension(Arc::new(test_state())),
            Some(Json(VolunteerRequest {
                name: "Amina".to_string(),
                email: "a@x.com".to_string(),
                phone: "not-a-phone".to_string(),
                county: "Nairobi".to_string(),
                availability: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
