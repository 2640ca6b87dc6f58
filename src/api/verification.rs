//! OTP and CAPTCHA verification endpoints used by the public detail forms.

use axum::{extract::State, Json};

use super::{ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{
    MessageResponse, SendOtpRequest, VerificationResponse, VerifyCaptchaRequest, VerifyOtpRequest,
};
use crate::validation;
use crate::AppState;

/// POST /api/send-otp - Mail a one-time password to the visitor.
///
/// Requires a CAPTCHA pass for the same email.
pub async fn send_otp(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SendOtpRequest>,
) -> ApiResult<MessageResponse> {
    let email = request.email.trim();
    validation::email("email", email)?;

    if !state.verifier.take_captcha_grant(email).await {
        tracing::warn!(%email, "OTP requested without a CAPTCHA pass");
        return Err(AppError::Forbidden(
            "Please complete the CAPTCHA first".to_string(),
        ));
    }

    state.verifier.send_otp(email).await?;
    tracing::info!(%email, "OTP sent");

    Ok(Json(MessageResponse::new(format!("OTP sent to {}", email))))
}

/// POST /api/verify-otp - Check a one-time password.
pub async fn verify_otp(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyOtpRequest>,
) -> ApiResult<VerificationResponse> {
    if !state.verifier.verify_otp(&request.email, &request.otp).await {
        return Err(AppError::Validation("Invalid or expired OTP".to_string()));
    }

    Ok(Json(VerificationResponse { success: true }))
}

/// POST /api/verify-captcha - Check a CAPTCHA token with the provider and
/// clear the email to request one OTP.
pub async fn verify_captcha(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyCaptchaRequest>,
) -> ApiResult<VerificationResponse> {
    let email = request.email.trim();
    validation::email("email", email)?;

    if !state.verifier.verify_captcha(email, &request.token).await? {
        return Err(AppError::Validation(
            "CAPTCHA verification failed".to_string(),
        ));
    }

    Ok(Json(VerificationResponse { success: true }))
}
