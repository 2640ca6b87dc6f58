//! Email OTP and CAPTCHA verification for the public detail forms.
//!
//! A detail query is only stored after the visitor passes a CAPTCHA and
//! proves control of their email address. Each step leaves a single-use
//! grant keyed by email that the next endpoint takes: `verify_captcha`
//! clears `send_otp`, and `verify_otp` clears the submission.

mod captcha;
mod mailer;

pub use captcha::*;
pub use mailer::*;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::RwLock;

use crate::auth::constant_time_compare;
use crate::errors::AppError;

/// Wrong guesses tolerated before a code is discarded.
const MAX_OTP_ATTEMPTS: u32 = 5;

/// How long a successful OTP check keeps the email cleared for submission.
pub const GRANT_TTL: Duration = Duration::from_secs(15 * 60);

/// How long a passed CAPTCHA keeps the email cleared to request a code.
pub const CAPTCHA_GRANT_TTL: Duration = Duration::from_secs(10 * 60);

struct PendingOtp {
    code: String,
    expires_at: Instant,
    attempts: u32,
}

/// Single-use, expiring clearances keyed by normalized email.
pub struct Grants {
    entries: RwLock<HashMap<String, Instant>>,
    ttl: Duration,
}

impl Grants {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn grant(&self, email: &str) {
        self.entries
            .write()
            .await
            .insert(normalize(email), Instant::now() + self.ttl);
    }

    /// Take the grant for `email`, if a live one exists.
    pub async fn take(&self, email: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries.retain(|_, expires_at| *expires_at > Instant::now());
        entries.remove(&normalize(email)).is_some()
    }
}

/// Pending one-time passwords and verification grants, keyed by email.
pub struct OtpStore {
    pending: RwLock<HashMap<String, PendingOtp>>,
    grants: Grants,
    ttl: Duration,
}

impl OtpStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: RwLock::new(HashMap::new()),
            grants: Grants::new(GRANT_TTL),
            ttl,
        }
    }

    /// Issue a fresh code for `email`, replacing any pending one.
    pub async fn issue(&self, email: &str) -> String {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        let mut pending = self.pending.write().await;
        pending.retain(|_, otp| otp.expires_at > Instant::now());
        pending.insert(
            normalize(email),
            PendingOtp {
                code: code.clone(),
                expires_at: Instant::now() + self.ttl,
                attempts: 0,
            },
        );
        code
    }

    /// Check a code. A match consumes it and records a grant.
    pub async fn verify(&self, email: &str, code: &str) -> bool {
        let key = normalize(email);
        let mut pending = self.pending.write().await;

        let Some(otp) = pending.get_mut(&key) else {
            return false;
        };

        if otp.expires_at <= Instant::now() {
            pending.remove(&key);
            return false;
        }

        if !constant_time_compare(code.trim(), &otp.code) {
            otp.attempts += 1;
            if otp.attempts >= MAX_OTP_ATTEMPTS {
                tracing::info!(email = %key, "OTP discarded after too many attempts");
                pending.remove(&key);
            }
            return false;
        }

        pending.remove(&key);
        drop(pending);

        self.grants.grant(&key).await;
        true
    }

    /// Take the grant for `email`, if a live one exists.
    pub async fn take_grant(&self, email: &str) -> bool {
        self.grants.take(email).await
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// OTP, mail and CAPTCHA collaborators bundled for the handlers.
pub struct Verifier {
    pub otps: OtpStore,
    captcha_grants: Grants,
    mailer: Arc<dyn Mailer>,
    captcha: Arc<dyn CaptchaVerifier>,
}

impl Verifier {
    pub fn new(otp_ttl: Duration, mailer: Arc<dyn Mailer>, captcha: Arc<dyn CaptchaVerifier>) -> Self {
        Self {
            otps: OtpStore::new(otp_ttl),
            captcha_grants: Grants::new(CAPTCHA_GRANT_TTL),
            mailer,
            captcha,
        }
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    /// Issue an OTP for `email` and mail it.
    pub async fn send_otp(&self, email: &str) -> Result<(), AppError> {
        let code = self.otps.issue(email).await;
        let minutes = self.otps.ttl.as_secs() / 60;
        self.mailer
            .send(
                email,
                "Your verification code",
                &format!(
                    "Your verification code is {}. It expires in {} minutes.",
                    code,
                    minutes.max(1)
                ),
            )
            .await
    }

    pub async fn verify_otp(&self, email: &str, code: &str) -> bool {
        self.otps.verify(email, code).await
    }

    /// Check a CAPTCHA token. A pass clears `email` to request one code.
    pub async fn verify_captcha(&self, email: &str, token: &str) -> Result<bool, AppError> {
        if token.trim().is_empty() {
            return Ok(false);
        }
        if !self.captcha.verify(token).await? {
            return Ok(false);
        }
        self.captcha_grants.grant(email).await;
        Ok(true)
    }

    /// Take the CAPTCHA clearance for `email`, if a live one exists.
    pub async fn take_captcha_grant(&self, email: &str) -> bool {
        self.captcha_grants.take(email).await
    }

    pub async fn take_grant(&self, email: &str) -> bool {
        self.otps.take_grant(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_code_is_single_use_and_leaves_grant() {
        let store = OtpStore::new(Duration::from_secs(60));
        let code = store.issue("Pilot@Example.com").await;
        assert_eq!(code.len(), 6);

        assert!(store.verify("pilot@example.com", &code).await);
        assert!(!store.verify("pilot@example.com", &code).await);

        assert!(store.take_grant("pilot@example.com").await);
        assert!(!store.take_grant("pilot@example.com").await);
    }

    #[tokio::test]
    async fn test_wrong_code_gives_no_grant() {
        let store = OtpStore::new(Duration::from_secs(60));
        let code = store.issue("a@example.com").await;
        let wrong = if code == "000000" { "111111" } else { "000000" };

        assert!(!store.verify("a@example.com", wrong).await);
        assert!(!store.take_grant("a@example.com").await);
        assert!(store.verify("a@example.com", &code).await);
    }

    #[tokio::test]
    async fn test_code_discarded_after_max_attempts() {
        let store = OtpStore::new(Duration::from_secs(60));
        let code = store.issue("b@example.com").await;
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for _ in 0..MAX_OTP_ATTEMPTS {
            assert!(!store.verify("b@example.com", wrong).await);
        }
        assert!(!store.verify("b@example.com", &code).await);
    }

    #[tokio::test]
    async fn test_grants_are_single_use_and_expire() {
        let grants = Grants::new(Duration::from_secs(60));
        grants.grant(" Pilot@Example.com").await;
        assert!(!grants.take("other@example.com").await);
        assert!(grants.take("pilot@example.com").await);
        assert!(!grants.take("pilot@example.com").await);

        let expired = Grants::new(Duration::ZERO);
        expired.grant("pilot@example.com").await;
        assert!(!expired.take("pilot@example.com").await);
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let store = OtpStore::new(Duration::ZERO);
        let code = store.issue("c@example.com").await;
        assert!(!store.verify("c@example.com", &code).await);
    }
}
