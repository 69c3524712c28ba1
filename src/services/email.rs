//! Outbound account email.
//!
//! Delivery is a collaborator of the auth gateway. Failures are reported to the
//! caller, which logs them and carries on; no auth flow is undone because a
//! message could not be sent.

use async_trait::async_trait;
use tracing::info;

use crate::errors::Result;

/// Sends verification and password reset links
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_verification(&self, email: &str, link: &str) -> Result<()>;

    async fn send_password_reset(&self, email: &str, link: &str) -> Result<()>;
}

/// Writes each message to the log instead of delivering it
#[derive(Debug, Clone)]
pub struct LogEmailSender {
    from: String,
}

impl LogEmailSender {
    pub fn new<S: Into<String>>(from: S) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_verification(&self, email: &str, link: &str) -> Result<()> {
        info!(from = %self.from, to = %email, %link, kind = "verification", "Sending email");
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, link: &str) -> Result<()> {
        info!(from = %self.from, to = %email, %link, kind = "password_reset", "Sending email");
        Ok(())
    }
}
