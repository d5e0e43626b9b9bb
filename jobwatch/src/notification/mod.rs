//! Notification system module.
//!
//! Pushes newly seen postings to external channels (Telegram, Email). Every
//! channel honours the same contract: [`NotificationChannel::deliver`] returns
//! `true` only when the remote endpoint accepted the message.
//!
//! # Example
//!
//! ```ignore
//! use jobwatch::notification::{build_channels, ChannelConfig, TelegramConfig};
//!
//! let channels = build_channels(
//!     &[ChannelConfig::Telegram(TelegramConfig {
//!         enabled: true,
//!         bot_token: "123:ABC".to_string(),
//!         chat_id: "456".to_string(),
//!         ..Default::default()
//!     })],
//!     std::time::Duration::from_secs(10),
//! );
//! ```

pub mod channels;
pub mod message;

pub use channels::{
    ChannelConfig, EmailChannel, EmailConfig, NotificationChannel, TelegramChannel,
    TelegramConfig, build_channels,
};
