//! Bearer token service.
//!
//! Issues and validates the two token kinds the API uses:
//!
//! - **full** tokens carry `{userId, role}` and authenticate every cart,
//!   order, address, and wishlist call;
//! - **profile** tokens carry only a verified phone number and are valid
//!   just long enough to complete registration after OTP verification.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sylera_core::{UserId, UserRole};

/// How long a profile-completion token stays valid.
const PROFILE_TOKEN_TTL_MINUTES: i64 = 15;

/// Claims stored in a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// User ID for full tokens, verified phone for profile tokens.
    sub: String,
    /// Role name; present on full tokens only.
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    /// Token kind: `full` or `profile`.
    kind: String,
    /// Expiration timestamp.
    exp: i64,
    /// Issued at timestamp.
    iat: i64,
}

/// Token errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("wrong token kind")]
    WrongKind,
    #[error("token generation failed: {0}")]
    GenerationFailed(String),
}

/// The authenticated identity decoded from a full token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: UserId,
    pub role: UserRole,
}

/// Encodes and validates HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    full_ttl_hours: i64,
}

impl TokenService {
    /// Create a token service from the signing secret.
    #[must_use]
    pub fn new(secret: &SecretString, full_ttl_hours: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            full_ttl_hours,
        }
    }

    /// Issue a full token for an authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::GenerationFailed` if encoding fails.
    pub fn issue_full(&self, user_id: UserId, role: UserRole) -> Result<String, TokenError> {
        self.issue(
            user_id.to_string(),
            Some(role.to_string()),
            "full",
            Duration::hours(self.full_ttl_hours),
        )
    }

    /// Issue a short-lived profile-completion token for a verified phone.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::GenerationFailed` if encoding fails.
    pub fn issue_profile(&self, phone: &str) -> Result<String, TokenError> {
        self.issue(
            phone.to_string(),
            None,
            "profile",
            Duration::minutes(PROFILE_TOKEN_TTL_MINUTES),
        )
    }

    fn issue(
        &self,
        sub: String,
        role: Option<String>,
        kind: &str,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub,
            role,
            kind: kind.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::GenerationFailed(e.to_string()))
    }

    /// Validate a full token and return the identity it carries.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the token is invalid, expired, or not a
    /// full token.
    pub fn verify_full(&self, token: &str) -> Result<AuthUser, TokenError> {
        let claims = self.verify(token)?;
        if claims.kind != "full" {
            return Err(TokenError::WrongKind);
        }

        let id: i64 = claims.sub.parse().map_err(|_| TokenError::Invalid)?;
        let role: UserRole = claims
            .role
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|_| TokenError::Invalid)?;

        Ok(AuthUser {
            id: UserId::new(id),
            role,
        })
    }

    /// Validate a profile token and return the verified phone number.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the token is invalid, expired, or not a
    /// profile token.
    pub fn verify_profile(&self, token: &str) -> Result<String, TokenError> {
        let claims = self.verify(token)?;
        if claims.kind != "profile" {
            return Err(TokenError::WrongKind);
        }
        Ok(claims.sub)
    }

    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

/// Extract the bearer token from an `Authorization` header value.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            &SecretString::from("kJ8qL2mN9pR4sT7vW1xZ5aB3cD6eF0gH"),
            168,
        )
    }

    #[test]
    fn test_full_token_roundtrip() {
        let tokens = service();
        let token = tokens
            .issue_full(UserId::new(42), UserRole::Admin)
            .expect("issue");

        let user = tokens.verify_full(&token).expect("verify");
        assert_eq!(user.id, UserId::new(42));
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn test_profile_token_roundtrip() {
        let tokens = service();
        let token = tokens.issue_profile("+919876543210").expect("issue");
        let phone = tokens.verify_profile(&token).expect("verify");
        assert_eq!(phone, "+919876543210");
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let tokens = service();
        let profile = tokens.issue_profile("+919876543210").expect("issue");
        assert!(matches!(
            tokens.verify_full(&profile),
            Err(TokenError::WrongKind)
        ));

        let full = tokens
            .issue_full(UserId::new(1), UserRole::User)
            .expect("issue");
        assert!(matches!(
            tokens.verify_profile(&full),
            Err(TokenError::WrongKind)
        ));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let tokens = service();
        let other = TokenService::new(
            &SecretString::from("a0B1c2D3e4F5g6H7i8J9k0L1m2N3o4P5"),
            168,
        );

        let token = other
            .issue_full(UserId::new(1), UserRole::User)
            .expect("issue");
        assert!(matches!(tokens.verify_full(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Basic abc"), None);
    }
}
