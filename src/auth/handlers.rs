//! Auth HTTP Handlers
//!
//! - `POST /auth/request` - issue a one-time code for a phone number
//! - `POST /auth/verify` - exchange the code for a JWT

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::ApiError;

use super::otp::OtpStore;
use super::sessions;
use super::users::{self, User};

#[derive(Debug, Deserialize)]
pub struct RequestOtpRequest {
    pub phone_number: String,
}

#[derive(Debug, Serialize)]
pub struct RequestOtpResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone_number: String,
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub token: String,
    pub user: User,
    pub is_new_user: bool,
}

/// Issue a one-time code.
///
/// There is no SMS gateway; the code lands in the server log, which is
/// where development and test clients pick it up.
pub async fn request_otp(
    State(otp): State<OtpStore>,
    Json(request): Json<RequestOtpRequest>,
) -> Result<Json<RequestOtpResponse>, ApiError> {
    let phone_number = request.phone_number.trim();
    if phone_number.is_empty() {
        return Err(ApiError::invalid_participants("phone number required"));
    }

    let code = otp.issue(phone_number);
    tracing::info!("[Auth] OTP for {}: {}", phone_number, code);

    Ok(Json(RequestOtpResponse { success: true }))
}

/// Verify a one-time code and issue a session token.
///
/// Finds or creates the user row for the phone number; `is_new_user`
/// tells the client whether to run first-time setup.
pub async fn verify_otp(
    State(otp): State<OtpStore>,
    State(pool): State<SqlitePool>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, ApiError> {
    let phone_number = request.phone_number.trim();

    if !otp.verify(phone_number, request.otp.trim()) {
        return Err(ApiError::unauthorized("invalid OTP"));
    }

    let (user, is_new_user) = users::find_or_create_user(&pool, phone_number).await?;

    let token = sessions::create_token(user.id, &user.phone_number).map_err(|e| {
        tracing::error!("[Auth] failed to sign token: {:?}", e);
        ApiError::unauthorized("could not issue session token")
    })?;

    Ok(Json(VerifyOtpResponse {
        token,
        user,
        is_new_user,
    }))
}
