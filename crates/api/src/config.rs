//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `JWT_SECRET` - Token signing secret (min 32 chars, no placeholders)
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 4000)
//! - `JWT_TTL_HOURS` - Full token lifetime in hours (default: 168)
//! - `OTP_EXPIRY_MINUTES` - OTP code lifetime (default: 5)
//! - `OPS_INBOX_EMAIL` - Address notified of every new order
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`,
//!   `SMTP_FROM_ADDRESS` - email delivery; notifier is disabled when unset
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_SECRET_LENGTH: usize = 32;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Token signing secret
    pub jwt_secret: SecretString,
    /// Lifetime of a full auth token, in hours
    pub jwt_ttl_hours: i64,
    /// Lifetime of an OTP code, in minutes
    pub otp_expiry_minutes: i64,
    /// Operations inbox notified of every new order
    pub ops_inbox_email: Option<String>,
    /// SMTP delivery configuration; email notifier is disabled when `None`
    pub smtp: Option<SmtpConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// SMTP configuration for the email notifier.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the token secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(required_var("DATABASE_URL")?);

        let host: IpAddr = optional_var("API_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidEnvVar("API_HOST".into(), format!("{e}")))?;

        let port: u16 = optional_var("API_PORT")
            .unwrap_or_else(|| "4000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidEnvVar("API_PORT".into(), format!("{e}")))?;

        let jwt_secret = required_var("JWT_SECRET")?;
        validate_secret("JWT_SECRET", &jwt_secret)?;
        let jwt_secret = SecretString::from(jwt_secret);

        let jwt_ttl_hours = parse_optional("JWT_TTL_HOURS", 168)?;
        let otp_expiry_minutes = parse_optional("OTP_EXPIRY_MINUTES", 5)?;

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            jwt_ttl_hours,
            otp_expiry_minutes,
            ops_inbox_email: optional_var("OPS_INBOX_EMAIL"),
            smtp: Self::smtp_from_env()?,
            sentry_dsn: optional_var("SENTRY_DSN"),
            sentry_environment: optional_var("SENTRY_ENVIRONMENT"),
        })
    }

    /// Socket address the server binds to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Load the SMTP section; all-or-nothing.
    ///
    /// Returns `None` when `SMTP_HOST` is absent. When it is present, the
    /// remaining SMTP variables become required.
    fn smtp_from_env() -> Result<Option<SmtpConfig>, ConfigError> {
        let Some(host) = optional_var("SMTP_HOST") else {
            return Ok(None);
        };

        let port: u16 = optional_var("SMTP_PORT")
            .unwrap_or_else(|| "587".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".into(), format!("{e}")))?;

        Ok(Some(SmtpConfig {
            host,
            port,
            username: required_var("SMTP_USERNAME")?,
            password: SecretString::from(required_var("SMTP_PASSWORD")?),
            from_address: required_var("SMTP_FROM_ADDRESS")?,
        }))
    }
}

/// Read a required environment variable.
fn required_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

/// Read an optional environment variable, treating empty values as unset.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read an optional integer environment variable with a default.
fn parse_optional(name: &str, default: i64) -> Result<i64, ConfigError> {
    match optional_var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), format!("{e}"))),
        None => Ok(default),
    }
}

/// Reject secrets that are too short or look like placeholders.
fn validate_secret(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            name.to_string(),
            format!("must be at least {MIN_SECRET_LENGTH} characters"),
        ));
    }

    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                name.to_string(),
                format!("contains placeholder pattern \"{pattern}\""),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_secret_rejects_short_values() {
        let err = validate_secret("JWT_SECRET", "short").expect_err("too short");
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_rejects_placeholders() {
        let err = validate_secret("JWT_SECRET", "changeme-changeme-changeme-changeme")
            .expect_err("placeholder");
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_accepts_random_value() {
        validate_secret("JWT_SECRET", "kJ8qL2mN9pR4sT7vW1xZ5aB3cD6eF0gH").expect("valid");
    }
}
