//! Email notification channel using SMTP.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::NotificationChannel;
use crate::domain::Posting;
use crate::notification::message::{email_html, email_subject, email_text};
use crate::{Error, Result};

/// Sender placeholder left in `.env` by the setup template.
const PLACEHOLDER_SENDER: &str = "your_email@gmail.com";

/// Email channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Whether the channel is enabled.
    pub enabled: bool,
    /// SMTP server host.
    pub smtp_host: String,
    /// SMTP server port.
    pub smtp_port: u16,
    /// SMTP username.
    pub smtp_username: Option<String>,
    /// SMTP password.
    pub smtp_password: Option<String>,
    /// Upgrade the connection with STARTTLS.
    pub use_tls: bool,
    /// Sender email address.
    pub from_address: String,
    /// Recipient email addresses.
    pub to_addresses: Vec<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            use_tls: true,
            from_address: String::new(),
            to_addresses: Vec::new(),
        }
    }
}

/// Email notification channel.
pub struct EmailChannel {
    config: EmailConfig,
    timeout: Duration,
}

impl EmailChannel {
    /// Create a new Email channel.
    pub fn new(config: EmailConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    /// Build the MIME message for a posting.
    fn build_message(&self, posting: &Posting) -> Result<Message> {
        let from: Mailbox = self
            .config
            .from_address
            .parse()
            .map_err(|e| Error::Email(format!("invalid sender address: {e}")))?;

        let mut builder = Message::builder().from(from).subject(email_subject(posting));
        for to in &self.config.to_addresses {
            let mailbox: Mailbox = to
                .parse()
                .map_err(|e| Error::Email(format!("invalid recipient address '{to}': {e}")))?;
            builder = builder.to(mailbox);
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                email_text(posting),
                email_html(posting),
            ))
            .map_err(|e| Error::Email(format!("failed to build message: {e}")))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = if self.config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
                .map_err(|e| Error::Email(format!("invalid SMTP relay: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
        };

        let mut builder = builder
            .port(self.config.smtp_port)
            .timeout(Some(self.timeout));

        if let (Some(user), Some(password)) = (
            self.config.smtp_username.as_ref(),
            self.config.smtp_password.as_ref(),
        ) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(builder.build())
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn channel_type(&self) -> &'static str {
        "email"
    }

    fn is_enabled(&self) -> bool {
        let from = self.config.from_address.trim();
        self.config.enabled
            && !self.config.smtp_host.is_empty()
            && !from.is_empty()
            && from != PLACEHOLDER_SENDER
            && !self.config.to_addresses.is_empty()
    }

    async fn send(&self, posting: &Posting) -> Result<()> {
        if !self.is_enabled() {
            return Err(Error::config("Email sender or recipients not configured"));
        }

        let message = self.build_message(posting)?;
        self.transport()?
            .send(message)
            .await
            .map_err(|e| Error::Email(format!("SMTP send failed: {e}")))?;

        debug!(posting_id = %posting.id.short(), "Email notification sent");
        Ok(())
    }
}
