//! API handlers and shared utilities.
//!
//! Handlers validate their typed payloads at the boundary, call into the
//! domain services, and map the returned outcome enums onto HTTP responses.
//! Lookups that fail (unknown email/ID pair, wrong or expired code) are
//! reported as a soft `{success: false, message}` body with HTTP 200, so a
//! caller cannot probe which field mismatched; malformed input is a 400 and
//! store failures are a generic 500.

pub mod admin;
pub mod auth;
pub mod contact;
pub mod health;
pub mod member;
pub mod otp;
pub mod posts;
pub mod register;
pub mod root;
pub mod state;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Soft success/failure envelope used by the self-service endpoints.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Normalize an email for lookup/uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// National ID numbers are 6–10 digits once trimmed.
pub fn valid_id_number(id_number: &str) -> bool {
    Regex::new(r"^[0-9]{6,10}$").is_ok_and(|re| re.is_match(id_number))
}

/// Phone numbers: optional leading `+`, then 9–15 digits.
pub fn valid_phone(phone: &str) -> bool {
    Regex::new(r"^\+?[0-9]{9,15}$").is_ok_and(|re| re.is_match(phone))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Amina@Example.COM "), "amina@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co.ke"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn valid_id_number_bounds() {
        assert!(valid_id_number("123456"));
        assert!(valid_id_number("12345678"));
        assert!(valid_id_number("1234567890"));
        assert!(!valid_id_number("12345"));
        assert!(!valid_id_number("12345678901"));
        assert!(!valid_id_number("12a45678"));
        assert!(!valid_id_number(""));
    }

    #[test]
    fn valid_phone_accepts_local_and_international() {
        assert!(valid_phone("0712345678"));
        assert!(valid_phone("+254712345678"));
        assert!(!valid_phone("0712-345-678"));
        assert!(!valid_phone("call me"));
    }

    #[test]
    fn api_message_constructors() {
        let ok = ApiMessage::ok("done");
        assert!(ok.success);
        assert_eq!(ok.message, "done");
        let fail = ApiMessage::fail("nope");
        assert!(!fail.success);
        assert_eq!(fail.message, "nope");
    }
}
