//! Notification channels.
//!
//! This module provides the channels a new posting can be pushed to:
//! - Telegram Bot API
//! - Email (SMTP)

mod email;
mod telegram;

pub use email::{EmailChannel, EmailConfig};
pub use telegram::{TelegramChannel, TelegramConfig};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::Result;
use crate::domain::Posting;

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Check if the channel is enabled and fully configured.
    fn is_enabled(&self) -> bool;

    /// Push one posting. `Ok` means the remote endpoint accepted it.
    async fn send(&self, posting: &Posting) -> Result<()>;

    /// Push one posting within `timeout`.
    ///
    /// Errors and timeouts both come back as `false`; nothing escapes.
    async fn deliver(&self, posting: &Posting, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.send(posting)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(
                    channel = self.channel_type(),
                    posting_id = %posting.id.short(),
                    error = %e,
                    "Delivery failed"
                );
                false
            }
            Err(_) => {
                warn!(
                    channel = self.channel_type(),
                    posting_id = %posting.id.short(),
                    ?timeout,
                    "Delivery timed out"
                );
                false
            }
        }
    }
}

/// Channel configuration wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelConfig {
    /// Telegram Bot API channel.
    Telegram(TelegramConfig),
    /// Email channel.
    Email(EmailConfig),
}

impl ChannelConfig {
    /// Get the channel type name.
    pub fn channel_type(&self) -> &'static str {
        match self {
            Self::Telegram(_) => "telegram",
            Self::Email(_) => "email",
        }
    }

    /// Build the runtime channel for this configuration.
    pub fn build(&self, request_timeout: Duration) -> Arc<dyn NotificationChannel> {
        match self {
            Self::Telegram(c) => Arc::new(TelegramChannel::new(c.clone(), request_timeout)),
            Self::Email(c) => Arc::new(EmailChannel::new(c.clone(), request_timeout)),
        }
    }
}

/// Build every enabled channel; disabled or incomplete ones are skipped.
pub fn build_channels(
    configs: &[ChannelConfig],
    request_timeout: Duration,
) -> Vec<Arc<dyn NotificationChannel>> {
    let mut channels = Vec::new();
    for config in configs {
        let channel = config.build(request_timeout);
        if channel.is_enabled() {
            info!("Initialized notification channel: {}", config.channel_type());
            channels.push(channel);
        } else {
            info!(
                "Notification channel {} disabled or not configured",
                config.channel_type()
            );
        }
    }
    if channels.is_empty() {
        warn!("No notification channels enabled; new postings will stay pending");
    }
    channels
}
