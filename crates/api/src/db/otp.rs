//! OTP code storage for phone login.
//!
//! At most one live code per phone: issuing a new code deletes any older
//! ones in the same transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sylera_core::Phone;

use super::RepositoryError;

/// A stored OTP challenge.
#[derive(Debug, sqlx::FromRow)]
pub struct OtpChallenge {
    pub otp_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Store a fresh code hash for a phone, replacing any previous codes.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn replace_code(
    pool: &PgPool,
    phone: &Phone,
    otp_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), RepositoryError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM otp_verifications WHERE phone = $1")
        .bind(phone.as_str())
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO otp_verifications (phone, otp_hash, expires_at) VALUES ($1, $2, $3)",
    )
    .bind(phone.as_str())
    .bind(otp_hash)
    .bind(expires_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(())
}

/// The most recent challenge for a phone, if any.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn latest_for_phone(
    pool: &PgPool,
    phone: &Phone,
) -> Result<Option<OtpChallenge>, RepositoryError> {
    let challenge = sqlx::query_as::<_, OtpChallenge>(
        r"
        SELECT otp_hash, expires_at FROM otp_verifications
        WHERE phone = $1
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        ",
    )
    .bind(phone.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(challenge)
}

/// Delete all challenges for a phone (after successful verification).
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn delete_for_phone(pool: &PgPool, phone: &Phone) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM otp_verifications WHERE phone = $1")
        .bind(phone.as_str())
        .execute(pool)
        .await?;

    Ok(())
}
