//! Database access for registrations, resignations, and data requests.

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use crate::api::handlers::auth::is_unique_violation;
use crate::member::membership_number;
use crate::member::models::{
    DataRequestType, MemberIdentity, MemberSnapshot, MembershipStatus, NewRegistration,
    Registration, VerificationStatus,
};

/// Outcome when inserting a new registration.
#[derive(Debug)]
pub enum RegistrationOutcome {
    Created(Uuid),
    /// Email or national ID already on the register (unique index hit).
    Conflict,
}

/// Outcome of an admin approval attempt.
#[derive(Debug)]
pub enum ApprovalOutcome {
    Approved { membership_number: String },
    NotPending,
}

const IDENTITY_COLUMNS: &str = "id, email, id_number, first_name, last_name";

fn identity_from_row(row: &sqlx::postgres::PgRow) -> MemberIdentity {
    MemberIdentity {
        id: row.get("id"),
        email: row.get("email"),
        id_number: row.get("id_number"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
    }
}

/// Look up a registration matching both the claimed email and national ID.
/// Both must match exactly; partial matches are treated as not registered.
pub async fn find_identity(
    pool: &PgPool,
    email: &str,
    id_number: &str,
) -> Result<Option<MemberIdentity>> {
    let query = format!(
        "SELECT {IDENTITY_COLUMNS} FROM registrations WHERE email = $1 AND id_number = $2"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .bind(id_number)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup registration by email and id number")?;

    Ok(row.as_ref().map(identity_from_row))
}

/// Look up a registration by email alone (resignation and data requests,
/// where identity was already proven through an OTP).
pub async fn find_identity_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<MemberIdentity>> {
    let query = format!("SELECT {IDENTITY_COLUMNS} FROM registrations WHERE email = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup registration by email")?;

    Ok(row.as_ref().map(identity_from_row))
}

/// Insert a pending registration. Uniqueness of email and national ID is
/// enforced by the store's unique indexes, not re-checked here.
pub async fn insert_registration(
    pool: &PgPool,
    new: &NewRegistration,
) -> Result<RegistrationOutcome> {
    let query = r"
        INSERT INTO registrations
            (first_name, last_name, email, phone, id_number, date_of_birth, gender,
             county, constituency, ward, disability_status, special_interest_groups,
             privacy_consent, terms_consent)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.id_number)
        .bind(new.date_of_birth)
        .bind(&new.gender)
        .bind(&new.county)
        .bind(&new.constituency)
        .bind(&new.ward)
        .bind(&new.disability_status)
        .bind(&new.special_interest_groups)
        .bind(new.privacy_consent)
        .bind(new.terms_consent)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(RegistrationOutcome::Created(row.get("id"))),
        Err(err) if is_unique_violation(&err) => Ok(RegistrationOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert registration"),
    }
}

/// Status fields for a `membership_check` verification response.
pub async fn snapshot_by_email(pool: &PgPool, email: &str) -> Result<Option<MemberSnapshot>> {
    let query = r"
        SELECT first_name, last_name, verification_status, membership_number
        FROM registrations
        WHERE email = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch member snapshot")?;

    row.map(|row| {
        let status: String = row.get("verification_status");
        Ok::<MemberSnapshot, sqlx::Error>(MemberSnapshot {
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            verification_status: VerificationStatus::from_db(&status)?,
            membership_number: row.get("membership_number"),
        })
    })
    .transpose()
    .context("failed to decode member snapshot")
}

/// Invoke the `check_membership_status` database function. The member-check
/// page answers "does this ID exist / what is its status" through this RPC
/// without reading table rows directly.
pub async fn membership_status(pool: &PgPool, id_number: &str) -> Result<MembershipStatus> {
    let query = r"
        SELECT found, verification_status, membership_number, first_name
        FROM check_membership_status($1)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id_number)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to call check_membership_status")?;

    Ok(MembershipStatus {
        found: row.get("found"),
        verification_status: row.get("verification_status"),
        membership_number: row.get("membership_number"),
        first_name: row.get("first_name"),
    })
}

/// Append an audit row recording a resignation. Written BEFORE the
/// registration row is deleted; see `service::resign` for the ordering
/// contract.
pub async fn insert_resignation_log(
    pool: &PgPool,
    email: &str,
    id_number: &str,
    full_name: &str,
    reason: Option<&str>,
) -> Result<()> {
    let query = r"
        INSERT INTO resignation_log (email, id_number, full_name, reason)
        VALUES ($1, $2, $3, $4)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .bind(id_number)
        .bind(full_name)
        .bind(reason)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to insert resignation log")?;
    Ok(())
}

/// Delete a registration row. Returns `false` when no row matched.
pub async fn delete_registration(pool: &PgPool, id: Uuid) -> Result<bool> {
    let query = "DELETE FROM registrations WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete registration")?;
    Ok(result.rows_affected() > 0)
}

/// Record a pending data-subject request. Status transitions after creation
/// are manual and administrative; nothing in this codebase updates them.
pub async fn insert_data_request(
    pool: &PgPool,
    email: &str,
    request_type: DataRequestType,
    reason: Option<&str>,
    details: Option<&str>,
) -> Result<Uuid> {
    let query = r"
        INSERT INTO data_requests (email, request_type, reason, details)
        VALUES ($1, $2, $3, $4)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(request_type.as_str())
        .bind(reason)
        .bind(details)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert data request")?;
    Ok(row.get("id"))
}

/// List registrations for the admin dashboard, newest first.
pub async fn list_registrations(
    pool: &PgPool,
    status: Option<VerificationStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Registration>> {
    let query = r"
        SELECT *
        FROM registrations
        WHERE ($1::text IS NULL OR verification_status = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    sqlx::query_as::<_, Registration>(query)
        .bind(status.map(VerificationStatus::as_str))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list registrations")
}

/// All registrations in registration order, for the CSV export.
pub async fn export_registrations(pool: &PgPool) -> Result<Vec<Registration>> {
    let query = "SELECT * FROM registrations ORDER BY created_at ASC";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    sqlx::query_as::<_, Registration>(query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to export registrations")
}

/// Fetch a registration by primary key.
pub async fn find_registration(pool: &PgPool, id: Uuid) -> Result<Option<Registration>> {
    let query = "SELECT * FROM registrations WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    sqlx::query_as::<_, Registration>(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch registration")
}

/// Approve a pending registration and allocate its membership number.
///
/// Allocation reads the highest number issued this year, increments it, and
/// writes the result in one transaction. The partial unique index on
/// `membership_number` turns a concurrent duplicate into a unique violation,
/// which is retried with a freshly-read maximum.
pub async fn approve_registration(pool: &PgPool, id: Uuid) -> Result<ApprovalOutcome> {
    let year = Utc::now().year();

    for _ in 0..3 {
        let mut tx = pool.begin().await.context("begin approval transaction")?;

        let query = r"
            SELECT membership_number
            FROM registrations
            WHERE membership_number LIKE $1
            ORDER BY membership_number DESC
            LIMIT 1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(format!("{}%", membership_number::year_prefix(year)))
            .fetch_optional(&mut *tx)
            .instrument(span)
            .await
            .context("failed to read highest membership number")?;

        let highest: Option<String> = row.map(|row| row.get("membership_number"));
        let number = membership_number::next_number(highest.as_deref(), year);

        let query = r"
            UPDATE registrations
            SET verification_status = 'approved',
                membership_number = $2,
                rejection_reason = NULL,
                verified_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
              AND verification_status = 'pending'
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(&number)
            .execute(&mut *tx)
            .instrument(span)
            .await;

        match result {
            Ok(result) if result.rows_affected() == 0 => {
                let _ = tx.rollback().await;
                return Ok(ApprovalOutcome::NotPending);
            }
            Ok(_) => {
                tx.commit().await.context("commit approval transaction")?;
                return Ok(ApprovalOutcome::Approved {
                    membership_number: number,
                });
            }
            Err(err) if is_unique_violation(&err) => {
                // Another approval took this number; re-read and retry.
                let _ = tx.rollback().await;
            }
            Err(err) => return Err(err).context("failed to approve registration"),
        }
    }

    Err(anyhow::anyhow!(
        "failed to allocate a unique membership number"
    ))
}

/// Reject a pending registration with the stated reason.
/// Returns `false` when the registration was not pending.
pub async fn reject_registration(pool: &PgPool, id: Uuid, reason: &str) -> Result<bool> {
    let query = r"
        UPDATE registrations
        SET verification_status = 'rejected',
            rejection_reason = $2,
            verified_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
          AND verification_status = 'pending'
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .bind(reason)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to reject registration")?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::{ApprovalOutcome, RegistrationOutcome};
    use uuid::Uuid;

    #[test]
    fn registration_outcome_debug_names() {
        let id = Uuid::nil();
        assert_eq!(
            format!("{:?}", RegistrationOutcome::Created(id)),
            format!("Created({id:?})")
        );
        assert_eq!(format!("{:?}", RegistrationOutcome::Conflict), "Conflict");
    }

    #[test]
    fn approval_outcome_debug_names() {
        assert_eq!(format!("{:?}", ApprovalOutcome::NotPending), "NotPending");
    }
}
