//! Database access for one-time codes.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::Instrument;

use crate::otp::models::ActionType;

/// Persist a freshly-generated code for `(email, action_type)`.
///
/// Any unused codes for the same pair are removed in the same transaction,
/// so at most one live code exists per pair at any time: issuing a new code
/// always invalidates its predecessors.
pub async fn create_code(
    pool: &PgPool,
    email: &str,
    action: ActionType,
    code: &str,
    ttl_minutes: i64,
) -> Result<()> {
    let mut tx = pool.begin().await.context("begin otp issuance transaction")?;

    let query = r"
        DELETE FROM otp_codes
        WHERE email = $1
          AND action_type = $2
          AND used = FALSE
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .bind(action.as_str())
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to invalidate prior codes")?;

    let query = r"
        INSERT INTO otp_codes (email, code, action_type, expires_at)
        VALUES ($1, $2, $3, NOW() + ($4 * INTERVAL '1 minute'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .bind(code)
        .bind(action.as_str())
        .bind(ttl_minutes)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to insert otp code")?;

    tx.commit().await.context("commit otp issuance transaction")?;
    Ok(())
}

/// Consume a code: a single conditional update flips `used` to true only
/// when the code matches, is unused, and has not expired. Returns `false`
/// otherwise. A consumed code can never be consumed again.
pub async fn consume_code(
    pool: &PgPool,
    email: &str,
    code: &str,
    action: ActionType,
) -> Result<bool> {
    let query = r"
        UPDATE otp_codes
        SET used = TRUE
        WHERE email = $1
          AND code = $2
          AND action_type = $3
          AND used = FALSE
          AND expires_at > NOW()
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(code)
        .bind(action.as_str())
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to consume otp code")?;

    Ok(row.is_some())
}
