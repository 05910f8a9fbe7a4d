//! OTP login handlers.
//!
//! The flow mirrors a phone-first storefront: request a code, verify it,
//! and either receive a full token (known phone) or a short-lived profile
//! token that unlocks `complete-profile`.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use sylera_core::{Phone, UserId, UserRole};

use crate::db::{otp, users};
use crate::error::{AppError, Result};
use crate::middleware::auth::{RequireUser, RequireVerifiedPhone};
use crate::services::{hashing, otp as otp_codes};
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send-otp", post(send_otp))
        .route("/verify-otp", post(verify_otp))
        .route("/complete-profile", post(complete_profile))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Issue a one-time code for a phone number.
///
/// The code is hashed before storage and handed to the SMS channel; the
/// tracing log stands in for a real gateway in development.
///
/// # Errors
///
/// Returns an error for an unparseable phone or a store failure.
pub async fn send_otp(
    State(state): State<AppState>,
    Json(body): Json<SendOtpRequest>,
) -> Result<Json<MessageResponse>> {
    let phone = Phone::parse(&body.phone).map_err(|e| AppError::Validation(e.to_string()))?;

    let code = otp_codes::generate_code();
    let code_hash = hashing::hash(&code).map_err(|e| AppError::Internal(e.to_string()))?;
    let expires_at = otp_codes::expiry(state.config().otp_expiry_minutes);

    otp::replace_code(state.pool(), &phone, &code_hash, expires_at).await?;

    // Stand-in for the SMS gateway; delivery failures must never fail the
    // request either way.
    tracing::info!(phone = %phone, code = %code, "OTP issued");

    Ok(Json(MessageResponse { message: "OTP sent" }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub otp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpResponse {
    pub token: String,
    pub profile_complete: bool,
}

/// Verify a one-time code.
///
/// Known phones get a full token; unknown phones get a profile token that
/// only `complete-profile` accepts.
///
/// # Errors
///
/// Returns a validation error for a missing, expired, or wrong code.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>> {
    let phone = Phone::parse(&body.phone).map_err(|e| AppError::Validation(e.to_string()))?;

    let challenge = otp::latest_for_phone(state.pool(), &phone).await?;
    let challenge = challenge
        .filter(|c| c.expires_at > chrono::Utc::now())
        .ok_or_else(|| AppError::Validation("OTP expired or invalid".into()))?;

    if !hashing::verify(&body.otp, &challenge.otp_hash) {
        return Err(AppError::Validation("Invalid OTP".into()));
    }

    otp::delete_for_phone(state.pool(), &phone).await?;

    match users::find_by_phone(state.pool(), &phone).await? {
        Some(user) => {
            let token = issue_full_token(&state, user.id, user.role)?;
            Ok(Json(VerifyOtpResponse {
                token,
                profile_complete: true,
            }))
        }
        None => {
            let token = state
                .tokens()
                .issue_profile(phone.as_str())
                .map_err(|e| AppError::Internal(e.to_string()))?;
            Ok(Json(VerifyOtpResponse {
                token,
                profile_complete: false,
            }))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompleteProfileRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct CompleteProfileResponse {
    pub token: String,
}

/// Create the user record for a phone that just passed OTP verification.
///
/// # Errors
///
/// Returns a validation error for empty fields and a conflict if the phone
/// is already registered.
pub async fn complete_profile(
    RequireVerifiedPhone(phone): RequireVerifiedPhone,
    State(state): State<AppState>,
    Json(body): Json<CompleteProfileRequest>,
) -> Result<Json<CompleteProfileResponse>> {
    if body.name.trim().is_empty() || body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation("All fields required".into()));
    }
    if !body.email.contains('@') {
        return Err(AppError::Validation("Invalid email address".into()));
    }

    let phone = Phone::parse(&phone).map_err(|e| AppError::Validation(e.to_string()))?;
    let password_hash =
        hashing::hash(&body.password).map_err(|e| AppError::Internal(e.to_string()))?;

    let user = users::create(
        state.pool(),
        &phone,
        body.name.trim(),
        body.email.trim(),
        &password_hash,
    )
    .await?;

    let token = issue_full_token(&state, user.id, user.role)?;

    let notifier = state.notifier().clone();
    let (email, name) = (user.email, user.name);
    tokio::spawn(async move {
        notifier.welcome(&email, &name).await;
    });

    Ok(Json(CompleteProfileResponse { token }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub phone: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// The authenticated user's profile.
///
/// # Errors
///
/// Returns `NotFound` if the user row has been deleted.
pub async fn me(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>> {
    let user = users::get(state.pool(), user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(UserResponse {
        id: user.id,
        phone: user.phone.to_string(),
        name: user.name,
        email: user.email,
        role: user.role,
        created_at: user.created_at,
    }))
}

fn issue_full_token(state: &AppState, user_id: UserId, role: UserRole) -> Result<String> {
    state
        .tokens()
        .issue_full(user_id, role)
        .map_err(|e| AppError::Internal(e.to_string()))
}
