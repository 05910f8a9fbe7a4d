//! Admin role management.

use tracing::info;

use sylera_core::Phone;

use super::CommandError;

/// Grant the admin role to the user with the given phone number.
///
/// # Errors
///
/// Returns an error if the phone is invalid or no user has it.
pub async fn promote(phone: &str) -> Result<(), CommandError> {
    let phone = Phone::parse(phone).map_err(|e| CommandError::Invalid(e.to_string()))?;

    let pool = super::connect().await?;

    let result = sqlx::query("UPDATE users SET role = 'admin' WHERE phone = $1")
        .bind(phone.as_str())
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CommandError::Invalid(format!(
            "no user with phone {phone}"
        )));
    }

    info!(%phone, "user promoted to admin");
    Ok(())
}
