//! Outgoing mail seam.

use crate::errors::AppError;

/// Delivers short transactional emails (OTP codes, temporary passwords).
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// Development mailer that writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        tracing::info!(%to, %subject, %body, "Outgoing mail");
        Ok(())
    }
}
