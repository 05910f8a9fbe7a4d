//! Authentication extractors.
//!
//! Identity is never ambient: every handler that needs the caller states
//! so with an extractor parameter, and the decoded identity flows from
//! there into each store call.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::tokens::{AuthUser, TokenError, bearer_token};
use crate::state::AppState;

/// Extractor that requires a valid full token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     RequireUser(user): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, user {}!", user.id)
/// }
/// ```
pub struct RequireUser(pub AuthUser);

/// Extractor that additionally requires the admin role.
pub struct RequireAdmin(pub AuthUser);

/// Extractor for the profile-completion flow: yields the phone number
/// verified by OTP.
pub struct RequireVerifiedPhone(pub String);

fn authenticate<S>(parts: &Parts, state: &S) -> Result<AuthUser, AppError>
where
    AppState: FromRef<S>,
{
    let state = AppState::from_ref(state);
    let token = extract_token(parts)?;

    state.tokens().verify_full(token).map_err(token_rejection)
}

fn extract_token(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))
}

fn token_rejection(err: TokenError) -> AppError {
    match err {
        TokenError::Expired => AppError::Unauthorized("Token expired".into()),
        _ => AppError::Unauthorized("Invalid token".into()),
    }
}

impl<S> FromRequestParts<S> for RequireUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state)?;
        if !user.role.is_admin() {
            return Err(AppError::Forbidden("Admin access required".into()));
        }
        Ok(Self(user))
    }
}

impl<S> FromRequestParts<S> for RequireVerifiedPhone
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = extract_token(parts)?;

        state
            .tokens()
            .verify_profile(token)
            .map(Self)
            .map_err(token_rejection)
    }
}
