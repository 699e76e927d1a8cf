//! CSV export of the full register.

use axum::{
    extract::Extension,
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    response::IntoResponse,
};
use sqlx::PgPool;
use tracing::error;

use crate::api::handlers::auth::require_admin;
use crate::member::models::Registration;
use crate::member::repo;

const CSV_HEADER: [&str; 11] = [
    "First Name",
    "Last Name",
    "Email",
    "Phone",
    "National ID Number",
    "Date of Birth",
    "Gender",
    "County",
    "Constituency",
    "Ward",
    "Registered At",
];

/// Render registrations as CSV. Quoting (commas, quotes, newlines) is
/// handled by the csv writer.
fn render_csv(registrations: &[Registration]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for registration in registrations {
        let date_of_birth = registration.date_of_birth.format("%Y-%m-%d").to_string();
        let registered_at = registration.created_at.to_rfc3339();
        writer.write_record([
            registration.first_name.as_str(),
            registration.last_name.as_str(),
            registration.email.as_str(),
            registration.phone.as_str(),
            registration.id_number.as_str(),
            date_of_birth.as_str(),
            registration.gender.as_str(),
            registration.county.as_str(),
            registration.constituency.as_str(),
            registration.ward.as_str(),
            registered_at.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv writer: {err}"))?;
    Ok(String::from_utf8(bytes)?)
}

/// Download the register as CSV.
#[utoipa::path(
    get,
    path = "/v1/admin/registrations/export",
    responses(
        (status = 200, description = "CSV document", body = String, content_type = "text/csv"),
        (status = 401, description = "Missing admin session")
    ),
    tag = "admin"
)]
pub async fn export(headers: HeaderMap, pool: Extension<PgPool>) -> impl IntoResponse {
    if let Err(status) = require_admin(&headers, &pool).await {
        return status.into_response();
    }

    let registrations = match repo::export_registrations(&pool).await {
        Ok(registrations) => registrations,
        Err(err) => {
            error!("Failed to export registrations: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match render_csv(&registrations) {
        Ok(body) => (
            StatusCode::OK,
            [
                (CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    CONTENT_DISPOSITION,
                    "attachment; filename=\"registrations.csv\"",
                ),
            ],
            body,
        )
            .into_response(),
        Err(err) => {
            error!("Failed to render CSV: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::models::VerificationStatus;
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn registration(county: &str) -> Registration {
        Registration {
            id: Uuid::nil(),
            first_name: "Amina".to_string(),
            last_name: "Odhiambo".to_string(),
            email: "amina@example.com".to_string(),
            phone: "+254712345678".to_string(),
            id_number: "12345678".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12).expect("date"),
            gender: "female".to_string(),
            county: county.to_string(),
            constituency: "Westlands".to_string(),
            ward: "Parklands".to_string(),
            disability_status: None,
            special_interest_groups: vec![],
            privacy_consent: true,
            terms_consent: true,
            verification_status: VerificationStatus::Pending,
            membership_number: None,
            rejection_reason: None,
            verified_at: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn header_row_matches_export_contract() {
        let csv = render_csv(&[]).expect("csv");
        assert_eq!(
            csv.lines().next(),
            Some(
                "First Name,Last Name,Email,Phone,National ID Number,Date of Birth,\
                 Gender,County,Constituency,Ward,Registered At"
            )
        );
    }

    #[test]
    fn plain_fields_are_unquoted() {
        let csv = render_csv(&[registration("Nairobi")]).expect("csv");
        let row = csv.lines().nth(1).expect("data row");
        assert!(row.contains("Nairobi"));
        assert!(!row.contains('"'));
        assert!(row.contains("1990-04-12"));
    }

    #[test]
    fn county_with_comma_is_quoted_with_comma_preserved() {
        let csv = render_csv(&[registration("Nairobi, West")]).expect("csv");
        let row = csv.lines().nth(1).expect("data row");
        assert!(row.contains("\"Nairobi, West\""));
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let csv = render_csv(&[registration("the \"green\" county")]).expect("csv");
        let row = csv.lines().nth(1).expect("data row");
        assert!(row.contains("\"the \"\"green\"\" county\""));
    }
}
