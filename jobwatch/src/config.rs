//! Application configuration.
//!
//! Built once at startup from the process environment (after `.env` is
//! loaded) and passed by reference to the pieces that need it.

use std::path::PathBuf;
use std::time::Duration;

use crate::notification::{ChannelConfig, EmailConfig, TelegramConfig};
use crate::sources::SourcesConfig;
use crate::{Error, Result};

/// Default search keywords.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "computer science internship",
    "software engineer internship",
    "junior developer internship",
    "cs internship",
    "software development internship",
    "data science internship",
    "machine learning internship",
    "web developer internship",
];

const DEFAULT_DATABASE_URL: &str = "sqlite:data/jobs_database.db?mode=rwc";
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

/// Typed configuration for jobwatch.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Wait between two checking cycles.
    pub check_interval: Duration,
    /// Upper bound for each fetch and each channel delivery.
    pub request_timeout: Duration,
    pub log_dir: PathBuf,
    pub keywords: Vec<String>,
    pub telegram: TelegramConfig,
    pub email: EmailConfig,
    pub sources: SourcesConfig,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let check_interval = Duration::from_secs(
            parse_u64(&get, "CHECK_INTERVAL_SECS")?.unwrap_or(DEFAULT_CHECK_INTERVAL_SECS),
        );
        if check_interval.is_zero() {
            return Err(Error::config("CHECK_INTERVAL_SECS must be greater than zero"));
        }
        let request_timeout = Duration::from_secs(
            parse_u64(&get, "REQUEST_TIMEOUT_SECS")?.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );
        if request_timeout.is_zero() {
            return Err(Error::config("REQUEST_TIMEOUT_SECS must be greater than zero"));
        }

        let keywords = get("JOB_SEARCH_KEYWORDS")
            .map(|v| parse_csv(&v))
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect());

        let telegram = TelegramConfig {
            enabled: parse_bool(&get, "TELEGRAM_ENABLED")?.unwrap_or(true),
            bot_token: get("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            chat_id: get("TELEGRAM_CHAT_ID").unwrap_or_default(),
            ..Default::default()
        };

        let sender = get("EMAIL_SENDER").unwrap_or_default();
        let smtp_port = match parse_u64(&get, "SMTP_PORT")? {
            Some(port) => u16::try_from(port)
                .map_err(|_| Error::config(format!("SMTP_PORT out of range: {port}")))?,
            None => DEFAULT_SMTP_PORT,
        };
        let email = EmailConfig {
            enabled: parse_bool(&get, "EMAIL_ENABLED")?.unwrap_or(true),
            smtp_host: get("SMTP_SERVER").unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
            smtp_port,
            smtp_username: Some(sender.clone()).filter(|s| !s.is_empty()),
            smtp_password: get("EMAIL_PASSWORD"),
            use_tls: parse_bool(&get, "SMTP_STARTTLS")?.unwrap_or(true),
            from_address: sender,
            to_addresses: get("EMAIL_RECIPIENT")
                .map(|v| parse_csv(&v))
                .unwrap_or_default(),
        };

        let sources = SourcesConfig {
            github: parse_bool(&get, "SEARCH_GITHUB_JOBS")?.unwrap_or(true),
            indeed: parse_bool(&get, "SEARCH_INDEED")?.unwrap_or(true),
            indeed_publisher_id: get("INDEED_PUBLISHER_ID"),
            demo_mode: parse_bool(&get, "DEMO_MODE")?.unwrap_or(false),
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            check_interval,
            request_timeout,
            log_dir: PathBuf::from(get("LOG_DIR").unwrap_or_else(|| "logs".to_string())),
            keywords,
            telegram,
            email,
            sources,
        })
    }

    /// Channel configurations in delivery order.
    pub fn channel_configs(&self) -> Vec<ChannelConfig> {
        vec![
            ChannelConfig::Telegram(self.telegram.clone()),
            ChannelConfig::Email(self.email.clone()),
        ]
    }
}

fn parse_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool<G>(get: &G, key: &str) -> Result<Option<bool>>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(Error::config(format!("{key} must be a boolean, got '{raw}'"))),
    }
}

fn parse_u64<G>(get: &G, key: &str) -> Result<Option<u64>>
where
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|_| Error::config(format!("{key} must be a non-negative integer, got '{raw}'")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.check_interval, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.keywords.len(), DEFAULT_KEYWORDS.len());
        assert!(config.telegram.enabled);
        assert!(config.telegram.bot_token.is_empty());
        assert_eq!(config.email.smtp_host, "smtp.gmail.com");
        assert_eq!(config.email.smtp_port, 587);
        assert!(config.email.to_addresses.is_empty());
        assert!(config.sources.github);
        assert!(!config.sources.demo_mode);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("CHECK_INTERVAL_SECS", "300"),
            ("JOB_SEARCH_KEYWORDS", "rust intern, , systems intern"),
            ("TELEGRAM_ENABLED", "FALSE"),
            ("EMAIL_SENDER", "me@example.com"),
            ("EMAIL_PASSWORD", "secret"),
            ("EMAIL_RECIPIENT", "a@example.com,b@example.com"),
            ("SMTP_PORT", "2525"),
            ("DEMO_MODE", "yes"),
        ])
        .unwrap();

        assert_eq!(config.check_interval, Duration::from_secs(300));
        assert_eq!(config.keywords, vec!["rust intern", "systems intern"]);
        assert!(!config.telegram.enabled);
        assert_eq!(config.email.smtp_username.as_deref(), Some("me@example.com"));
        assert_eq!(config.email.smtp_password.as_deref(), Some("secret"));
        assert_eq!(config.email.to_addresses.len(), 2);
        assert_eq!(config.email.smtp_port, 2525);
        assert!(config.sources.demo_mode);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        assert!(matches!(
            config_from(&[("CHECK_INTERVAL_SECS", "soon")]),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            config_from(&[("EMAIL_ENABLED", "maybe")]),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            config_from(&[("SMTP_PORT", "70000")]),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            config_from(&[("CHECK_INTERVAL_SECS", "0")]),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_channel_configs_order() {
        let config = config_from(&[]).unwrap();
        let kinds: Vec<&str> = config
            .channel_configs()
            .iter()
            .map(|c| c.channel_type())
            .collect();
        assert_eq!(kinds, vec!["telegram", "email"]);
    }
}
