//! CAPTCHA token verification against a reCAPTCHA-compatible endpoint.

use std::time::Duration;

use serde::Deserialize;

use crate::errors::AppError;

/// Verification calls are abandoned after this long.
pub const CAPTCHA_TIMEOUT: Duration = Duration::from_secs(15);

/// Checks a CAPTCHA token produced by the browser widget.
#[async_trait::async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<bool, AppError>;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Verifier posting `secret` and `response` to the provider's siteverify URL.
pub struct HttpCaptchaVerifier {
    client: reqwest::Client,
    secret: Option<String>,
    verify_url: String,
}

impl HttpCaptchaVerifier {
    pub fn new(secret: Option<String>, verify_url: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(CAPTCHA_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            secret,
            verify_url,
        })
    }
}

#[async_trait::async_trait]
impl CaptchaVerifier for HttpCaptchaVerifier {
    async fn verify(&self, token: &str) -> Result<bool, AppError> {
        // Fail closed when no secret is configured.
        let Some(secret) = &self.secret else {
            tracing::warn!("CAPTCHA secret not configured (DRONE_CAPTCHA_SECRET); rejecting token");
            return Ok(false);
        };

        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Upstream("CAPTCHA verification timed out".to_string())
                } else {
                    AppError::Upstream(format!("CAPTCHA verification failed: {}", e))
                }
            })?;

        let body: SiteVerifyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Unreadable CAPTCHA response: {}", e)))?;

        if !body.success {
            tracing::info!(errors = ?body.error_codes, "CAPTCHA token rejected");
        }

        Ok(body.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_secret_fails_closed() {
        let verifier = HttpCaptchaVerifier::new(None, "http://127.0.0.1:9/verify".into()).unwrap();
        assert!(!verifier.verify("token").await.unwrap());
    }

    #[test]
    fn test_parses_provider_response() {
        let body: SiteVerifyResponse =
            serde_json::from_str(r#"{"success": false, "error-codes": ["timeout-or-duplicate"]}"#)
                .unwrap();
        assert!(!body.success);
        assert_eq!(body.error_codes, vec!["timeout-or-duplicate"]);
    }
}
