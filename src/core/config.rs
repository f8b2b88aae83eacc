//! Environment-driven configuration
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Added TELEGRAM_POLLING and HTTP_TIMEOUT_SECS
//! - 1.0.0: Initial configuration loaded from env / .env

use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::env;
use std::time::Duration;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: String,
    pub log_level: String,
    pub database_path: String,
    /// Bot token; sends fail with a "not configured" error when absent
    pub telegram_bot_token: Option<String>,
    /// Fallback chat when the settings row has none registered
    pub telegram_chat_id: Option<String>,
    pub telegram_api_url: String,
    /// Long-poll for chat commands alongside the scheduler
    pub telegram_polling: bool,
    pub weather_api_key: Option<String>,
    pub weather_api_url: String,
    pub default_city: String,
    pub timezone: Tz,
    pub http_timeout: Duration,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset, matching how .env files are usually written
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let timezone_name = get("TIMEZONE").unwrap_or_else(|| "Europe/Warsaw".to_string());
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid TIMEZONE '{timezone_name}': {e}"))?;

        let http_timeout_secs = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("Invalid HTTP_TIMEOUT_SECS '{raw}'"))?,
            None => 35,
        };

        let telegram_polling = match get("TELEGRAM_POLLING") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| anyhow::anyhow!("Invalid TELEGRAM_POLLING '{raw}'"))?,
            None => true,
        };

        Ok(Config {
            app_env: get("APP_ENV").unwrap_or_else(|| "development".to_string()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            database_path: get("DATABASE_PATH").unwrap_or_else(|| "lifehub.db".to_string()),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),
            telegram_api_url: get("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            telegram_polling,
            weather_api_key: get("WEATHER_API_KEY"),
            weather_api_url: get("WEATHER_API_URL")
                .unwrap_or_else(|| DEFAULT_WEATHER_API_URL.to_string()),
            default_city: get("DEFAULT_CITY").unwrap_or_else(|| "Warsaw".to_string()),
            timezone,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_path, "lifehub.db");
        assert_eq!(config.timezone, chrono_tz::Europe::Warsaw);
        assert_eq!(config.default_city, "Warsaw");
        assert_eq!(config.telegram_api_url, DEFAULT_TELEGRAM_API_URL);
        assert!(config.telegram_bot_token.is_none());
        assert!(config.telegram_polling);
        assert_eq!(config.http_timeout, Duration::from_secs(35));
        assert!(config.is_development());
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = config_from(&[("TELEGRAM_BOT_TOKEN", "  "), ("TELEGRAM_CHAT_ID", "")]).unwrap();
        assert!(config.telegram_bot_token.is_none());
        assert!(config.telegram_chat_id.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("TIMEZONE", "America/New_York"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_POLLING", "off"),
            ("HTTP_TIMEOUT_SECS", "10"),
            ("APP_ENV", "production"),
        ])
        .unwrap();
        assert_eq!(config.timezone, chrono_tz::America::New_York);
        assert_eq!(config.telegram_bot_token.as_deref(), Some("123:abc"));
        assert!(!config.telegram_polling);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert!(!config.is_development());
    }

    #[test]
    fn test_invalid_timezone_is_rejected() {
        assert!(config_from(&[("TIMEZONE", "Mars/Olympus")]).is_err());
    }

    #[test]
    fn test_invalid_bool_is_rejected() {
        assert!(config_from(&[("TELEGRAM_POLLING", "maybe")]).is_err());
    }
}
