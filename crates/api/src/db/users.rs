//! User repository.
//!
//! Identities are keyed on the phone number used for OTP login. Phone
//! numbers and roles are parsed on read; a row that fails to parse is
//! surfaced as `DataCorruption` rather than silently coerced.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sylera_core::{Phone, UserId, UserRole};

use super::{RepositoryError, is_unique_violation};

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub phone: Phone,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    phone: String,
    name: String,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let phone = Phone::parse(&self.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;
        let role = self.role.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(User {
            id: self.id,
            phone,
            name: self.name,
            email: self.email,
            role,
            created_at: self.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, phone, name, email, role, created_at";

/// Get a user by phone number.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_phone(pool: &PgPool, phone: &Phone) -> Result<Option<User>, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE phone = $1"
    ))
    .bind(phone.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(UserRow::into_user).transpose()
}

/// Get a user by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(pool: &PgPool, id: UserId) -> Result<Option<User>, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(UserRow::into_user).transpose()
}

/// Create a user after OTP verification and profile completion.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the phone is already registered.
pub async fn create(
    pool: &PgPool,
    phone: &Phone,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r"
        INSERT INTO users (phone, name, email, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING {USER_COLUMNS}
        ",
    ))
    .bind(phone.as_str())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            RepositoryError::Conflict("an account with this phone already exists".into())
        } else {
            RepositoryError::Database(e)
        }
    })?;

    row.into_user()
}

/// Grant a user the admin role, looked up by phone.
///
/// Used by the CLI; there is no HTTP surface for role changes.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if no user has that phone.
pub async fn promote_to_admin(pool: &PgPool, phone: &Phone) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE users SET role = 'admin' WHERE phone = $1")
        .bind(phone.as_str())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound("user not found".into()));
    }

    Ok(())
}
