use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

/// Lifecycle state of a registration, persisted as text in
/// `registrations.verification_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    /// Parse the persisted textual value into a typed enum.
    pub(crate) fn from_db(value: &str) -> Result<Self, sqlx::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid registrations.verification_status value: {value}"),
            )))),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Kind of data-subject request a member can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataRequestType {
    Correction,
    Deletion,
}

impl DataRequestType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correction => "correction",
            Self::Deletion => "deletion",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "correction" => Some(Self::Correction),
            "deletion" => Some(Self::Deletion),
            _ => None,
        }
    }
}

/// Full registration row.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub id_number: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub county: String,
    pub constituency: String,
    pub ward: String,
    pub disability_status: Option<String>,
    pub special_interest_groups: Vec<String>,
    pub privacy_consent: bool,
    pub terms_consent: bool,
    pub verification_status: VerificationStatus,
    pub membership_number: Option<String>,
    pub rejection_reason: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Registration {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("verification_status")?;
        Ok(Self {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            id_number: row.try_get("id_number")?,
            date_of_birth: row.try_get("date_of_birth")?,
            gender: row.try_get("gender")?,
            county: row.try_get("county")?,
            constituency: row.try_get("constituency")?,
            ward: row.try_get("ward")?,
            disability_status: row.try_get("disability_status")?,
            special_interest_groups: row.try_get("special_interest_groups")?,
            privacy_consent: row.try_get("privacy_consent")?,
            terms_consent: row.try_get("terms_consent")?,
            verification_status: VerificationStatus::from_db(&status)?,
            membership_number: row.try_get("membership_number")?,
            rejection_reason: row.try_get("rejection_reason")?,
            verified_at: row.try_get("verified_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Validated input for a new registration.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub id_number: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub county: String,
    pub constituency: String,
    pub ward: String,
    pub disability_status: Option<String>,
    pub special_interest_groups: Vec<String>,
    pub privacy_consent: bool,
    pub terms_consent: bool,
}

/// Minimal identity fields used when matching a self-service claim
/// (OTP issuance, resignation) against the register.
#[derive(Debug, Clone)]
pub struct MemberIdentity {
    pub id: Uuid,
    pub email: String,
    pub id_number: String,
    pub first_name: String,
    pub last_name: String,
}

/// Status fields returned alongside a successful `membership_check`
/// verification.
#[derive(Debug, Clone, Serialize)]
pub struct MemberSnapshot {
    pub first_name: String,
    pub last_name: String,
    pub verification_status: VerificationStatus,
    pub membership_number: Option<String>,
}

/// Result of the `check_membership_status` database function.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipStatus {
    pub found: bool,
    pub verification_status: Option<String>,
    pub membership_number: Option<String>,
    pub first_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_status_round_trips_text() {
        for status in [
            VerificationStatus::Pending,
            VerificationStatus::Approved,
            VerificationStatus::Rejected,
        ] {
            assert_eq!(VerificationStatus::parse(status.as_str()), Some(status));
            assert_eq!(
                VerificationStatus::from_db(status.as_str()).ok(),
                Some(status)
            );
        }
        assert_eq!(VerificationStatus::parse("deleted"), None);
        assert!(VerificationStatus::from_db("deleted").is_err());
    }

    #[test]
    fn data_request_type_parses_known_values_only() {
        assert_eq!(
            DataRequestType::parse("correction"),
            Some(DataRequestType::Correction)
        );
        assert_eq!(
            DataRequestType::parse("deletion"),
            Some(DataRequestType::Deletion)
        );
        assert_eq!(DataRequestType::parse("resignation"), None);
    }

    #[test]
    fn verification_status_serializes_lowercase() {
        let value = serde_json::to_value(VerificationStatus::Approved).unwrap();
        assert_eq!(value, serde_json::json!("approved"));
    }
}
