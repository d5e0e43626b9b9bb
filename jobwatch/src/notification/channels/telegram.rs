//! Telegram Bot API notification channel.
//!
//! Sends messages via the Telegram Bot API (`POST /bot<token>/sendMessage`).
//! One request per delivery; any non-2xx answer, 429 included, is a failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::NotificationChannel;
use crate::domain::Posting;
use crate::notification::message::{telegram_html, truncate_chars};
use crate::{Error, Result};

/// Telegram `sendMessage` text limit (UTF-8 characters).
const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Placeholder left in `.env` by the setup template.
const PLACEHOLDER_TOKEN: &str = "YOUR_BOT_TOKEN_HERE";
const PLACEHOLDER_CHAT_ID: &str = "YOUR_CHAT_ID_HERE";

/// Telegram channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Whether the channel is enabled.
    pub enabled: bool,
    /// Telegram Bot API token.
    pub bot_token: String,
    /// Target chat ID (user, group, or channel).
    pub chat_id: String,
    /// Bot API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_api_base(),
        }
    }
}

/// Telegram notification channel.
pub struct TelegramChannel {
    config: TelegramConfig,
    client: Client,
}

impl TelegramChannel {
    /// Create a new Telegram channel.
    pub fn new(config: TelegramConfig, request_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build Telegram HTTP client, using defaults");
                Client::new()
            });
        Self { config, client }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    /// Post one `sendMessage` request.
    async fn post_message(&self, payload: &serde_json::Value) -> Result<()> {
        let response = self.client.post(self.endpoint()).json(payload).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let description = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("description").and_then(|d| d.as_str()).map(str::to_string))
            .unwrap_or(body);
        Err(Error::Other(format!(
            "Telegram sendMessage failed: {} - {}",
            status, description
        )))
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn channel_type(&self) -> &'static str {
        "telegram"
    }

    fn is_enabled(&self) -> bool {
        let token = self.config.bot_token.trim();
        let chat_id = self.config.chat_id.trim();
        self.config.enabled
            && !token.is_empty()
            && token != PLACEHOLDER_TOKEN
            && !chat_id.is_empty()
            && chat_id != PLACEHOLDER_CHAT_ID
    }

    async fn send(&self, posting: &Posting) -> Result<()> {
        if !self.is_enabled() {
            return Err(Error::config("Telegram bot token or chat id not configured"));
        }

        let text = truncate_chars(
            &telegram_html(posting),
            TELEGRAM_MESSAGE_LIMIT,
            "\n\n[truncated]",
        );
        let payload = json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        self.post_message(&payload).await?;

        debug!(posting_id = %posting.id.short(), "Telegram notification sent");
        Ok(())
    }
}
