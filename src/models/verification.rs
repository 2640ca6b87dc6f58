//! Request and response bodies for the OTP and CAPTCHA endpoints.

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/send-otp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
}

/// Request body for `POST /api/verify-otp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Request body for `POST /api/verify-captcha`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCaptchaRequest {
    pub email: String,
    pub token: String,
}

/// Outcome of a successful verification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub success: bool,
}
