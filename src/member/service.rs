//! Membership state transitions: registration intake, resignation,
//! data-subject requests, and admin verification.
//!
//! Every transition mutates the store first and notifies by email after;
//! notification failures never fail the parent operation.

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::api::email::{messages, EmailSender};
use crate::member::models::{DataRequestType, NewRegistration};
use crate::member::repo::{self, ApprovalOutcome, RegistrationOutcome};

/// Result of a registration intake attempt.
#[derive(Debug)]
pub enum RegisterOutcome {
    Created(Uuid),
    Conflict,
}

/// Result of a resignation.
#[derive(Debug)]
pub enum ResignOutcome {
    Resigned,
    NotFound,
}

/// Result of a data-subject request submission.
#[derive(Debug)]
pub enum DataRequestOutcome {
    Submitted(Uuid),
    NotFound,
}

/// Admin decision over a pending registration.
#[derive(Debug, Clone)]
pub enum VerifyDecision {
    Approve,
    Reject { reason: String },
}

/// Result of applying an admin decision.
#[derive(Debug)]
pub enum VerifyMemberOutcome {
    Approved { membership_number: String },
    Rejected,
    NotFound,
    AlreadyProcessed,
}

/// Insert a pending registration and acknowledge it by email.
pub async fn register(
    pool: &PgPool,
    email_sender: &EmailSender,
    new: NewRegistration,
) -> Result<RegisterOutcome> {
    match repo::insert_registration(pool, &new).await? {
        RegistrationOutcome::Created(id) => {
            info!(registration_id = %id, "registration created");
            email_sender
                .send_best_effort(messages::registration_received(&new.email, &new.first_name))
                .await;
            Ok(RegisterOutcome::Created(id))
        }
        RegistrationOutcome::Conflict => Ok(RegisterOutcome::Conflict),
    }
}

/// Resign a member: write the audit log row, then delete the registration,
/// then confirm by email.
///
/// The log insert and the delete are two separate statements on purpose. If
/// the delete fails, the log row survives: the audit trail records the
/// member's intent even though the membership was not removed, and the
/// caller sees the failure and can retry.
pub async fn resign(
    pool: &PgPool,
    email_sender: &EmailSender,
    email: &str,
    reason: Option<&str>,
) -> Result<ResignOutcome> {
    let Some(identity) = repo::find_identity_by_email(pool, email).await? else {
        return Ok(ResignOutcome::NotFound);
    };

    let full_name = format!("{} {}", identity.first_name, identity.last_name);
    repo::insert_resignation_log(pool, &identity.email, &identity.id_number, &full_name, reason)
        .await?;

    if !repo::delete_registration(pool, identity.id).await? {
        // The log row above is left in place: audit survives the partial
        // failure and the membership is still intact.
        anyhow::bail!("registration vanished between resignation log and delete");
    }

    info!(email = %identity.email, "member resigned and registration deleted");
    email_sender
        .send_best_effort(messages::resignation_confirmation(
            &identity.email,
            &full_name,
        ))
        .await;

    Ok(ResignOutcome::Resigned)
}

/// Record a correction/deletion request for manual administrative
/// follow-through. Nothing here processes the request automatically.
pub async fn submit_data_request(
    pool: &PgPool,
    email_sender: &EmailSender,
    admin_email: &str,
    email: &str,
    request_type: DataRequestType,
    reason: Option<&str>,
    details: Option<&str>,
) -> Result<DataRequestOutcome> {
    if repo::find_identity_by_email(pool, email).await?.is_none() {
        return Ok(DataRequestOutcome::NotFound);
    }

    let id = repo::insert_data_request(pool, email, request_type, reason, details).await?;
    info!(request_id = %id, request_type = request_type.as_str(), "data request recorded");

    email_sender
        .send_best_effort(messages::data_request_ack(email, request_type))
        .await;
    email_sender
        .send_best_effort(messages::data_request_admin_alert(
            admin_email,
            email,
            request_type,
            reason,
            details,
        ))
        .await;

    Ok(DataRequestOutcome::Submitted(id))
}

/// Apply an admin approve/reject decision to a pending registration.
pub async fn verify_member(
    pool: &PgPool,
    email_sender: &EmailSender,
    id: Uuid,
    decision: VerifyDecision,
) -> Result<VerifyMemberOutcome> {
    let Some(registration) = repo::find_registration(pool, id).await? else {
        return Ok(VerifyMemberOutcome::NotFound);
    };

    match decision {
        VerifyDecision::Approve => match repo::approve_registration(pool, id).await? {
            ApprovalOutcome::Approved { membership_number } => {
                info!(registration_id = %id, membership_number, "registration approved");
                email_sender
                    .send_best_effort(messages::approval(
                        &registration.email,
                        &registration.first_name,
                        &membership_number,
                    ))
                    .await;
                Ok(VerifyMemberOutcome::Approved { membership_number })
            }
            ApprovalOutcome::NotPending => Ok(VerifyMemberOutcome::AlreadyProcessed),
        },
        VerifyDecision::Reject { reason } => {
            if repo::reject_registration(pool, id, &reason).await? {
                info!(registration_id = %id, "registration rejected");
                email_sender
                    .send_best_effort(messages::rejection(
                        &registration.email,
                        &registration.first_name,
                        &reason,
                    ))
                    .await;
                Ok(VerifyMemberOutcome::Rejected)
            } else {
                Ok(VerifyMemberOutcome::AlreadyProcessed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DataRequestOutcome, RegisterOutcome, ResignOutcome, VerifyMemberOutcome};
    use uuid::Uuid;

    #[test]
    fn outcome_debug_names() {
        assert_eq!(format!("{:?}", ResignOutcome::NotFound), "NotFound");
        assert_eq!(format!("{:?}", ResignOutcome::Resigned), "Resigned");
        assert_eq!(
            format!("{:?}", DataRequestOutcome::Submitted(Uuid::nil())),
            format!("Submitted({:?})", Uuid::nil())
        );
        assert_eq!(
            format!("{:?}", RegisterOutcome::Conflict),
            "Conflict"
        );
        assert_eq!(
            format!("{:?}", VerifyMemberOutcome::AlreadyProcessed),
            "AlreadyProcessed"
        );
    }
}
