//! One-time code issuance and verification.
//!
//! Every sensitive self-service action (status check, correction, deletion,
//! resignation) is gated through this single checkpoint: a code is only
//! issued to an email/ID pair already on the register, and each code can be
//! consumed exactly once within its validity window.

use anyhow::Result;
use rand::Rng;
use sqlx::PgPool;
use tracing::info;

use crate::api::email::{messages, EmailSender};
use crate::member::models::MemberSnapshot;
use crate::member::repo as member_repo;
use crate::otp::models::ActionType;
use crate::otp::repo;

/// Result of an issuance attempt.
#[derive(Debug)]
pub enum IssueOutcome {
    /// Code persisted; delivery was attempted best-effort.
    Issued,
    /// No registration matches the claimed email/ID pair.
    NotRegistered,
}

/// Result of a verification attempt.
#[derive(Debug)]
pub enum VerifyOutcome {
    /// Code matched and was consumed. For `membership_check` the member's
    /// status snapshot rides along; other actions return no member data.
    Verified(Option<MemberSnapshot>),
    InvalidOrExpired,
}

/// Generate a 6-digit code, uniform over 100000–999999.
pub(crate) fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Issue a code for `(email, id_number, action)`.
///
/// The code is considered issued once persisted; email delivery is
/// best-effort and a dispatch failure still returns `Issued` (the code
/// exists and is checkable even if this delivery never arrives).
pub async fn issue(
    pool: &PgPool,
    email_sender: &EmailSender,
    email: &str,
    id_number: &str,
    action: ActionType,
    ttl_minutes: i64,
) -> Result<IssueOutcome> {
    let Some(identity) = member_repo::find_identity(pool, email, id_number).await? else {
        info!(action = action.as_str(), "otp requested for unknown email/id pair");
        return Ok(IssueOutcome::NotRegistered);
    };

    let code = generate_code();
    repo::create_code(pool, &identity.email, action, &code, ttl_minutes).await?;
    info!(action = action.as_str(), "otp issued");

    email_sender
        .send_best_effort(messages::otp_code(
            &identity.email,
            &identity.first_name,
            &code,
            action,
            ttl_minutes,
        ))
        .await;

    Ok(IssueOutcome::Issued)
}

/// Verify and consume a code for `(email, code, action)`.
pub async fn verify(
    pool: &PgPool,
    email: &str,
    code: &str,
    action: ActionType,
) -> Result<VerifyOutcome> {
    if !repo::consume_code(pool, email, code, action).await? {
        return Ok(VerifyOutcome::InvalidOrExpired);
    }

    info!(action = action.as_str(), "otp verified");

    if action == ActionType::MembershipCheck {
        let snapshot = member_repo::snapshot_by_email(pool, email).await?;
        return Ok(VerifyOutcome::Verified(snapshot));
    }

    Ok(VerifyOutcome::Verified(None))
}

#[cfg(test)]
mod tests {
    use super::{generate_code, IssueOutcome, VerifyOutcome};

    #[test]
    fn generated_codes_are_six_digits_and_in_range() {
        for _ in 0..1000 {
            let code = generate_code();
            assert_eq!(code.len(), 6, "code {code} is not six digits");
            let value: u32 = code.parse().expect("code is numeric");
            assert!((100_000..=999_999).contains(&value), "code {value} out of range");
        }
    }

    #[test]
    fn generated_codes_never_have_a_leading_zero() {
        for _ in 0..1000 {
            let code = generate_code();
            assert_ne!(code.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn outcome_debug_names() {
        assert_eq!(format!("{:?}", IssueOutcome::NotRegistered), "NotRegistered");
        assert_eq!(
            format!("{:?}", VerifyOutcome::InvalidOrExpired),
            "InvalidOrExpired"
        );
    }
}
