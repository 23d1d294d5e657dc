//! # Configuration Management Module
//!
//! TOML configuration for the bot, with defaults for every section and two
//! environment overrides for secrets that should not live in the file.
//!
//! ## Configuration Structure
//!
//! - [`BotConfig`] - bot identity, admin chat and the "put it back" chance
//! - [`TelegramConfig`] - Bot API token, endpoint and long-poll timeout
//! - [`StorageConfig`] - data directory, ledger file, names file, images
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use macaronbot::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?.apply_env();
//!     println!("Data dir: {}", config.storage.data_dir);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bot]
//! name = "macaronbot"
//! admin_chat_id = 123456789
//! fail_chance = 0.05
//!
//! [telegram]
//! api_token = ""
//! api_base = "https://api.telegram.org"
//! poll_timeout_secs = 30
//!
//! [storage]
//! data_dir = "./data"
//! db_file = "db.json"
//! names_file = "names.txt"
//! images_dir = "./images"
//!
//! [logging]
//! level = "info"
//! file = "macaronbot.log"
//! ```
//!
//! ## Environment Integration
//!
//! `MACARON_BOT_API_TOKEN` overrides `telegram.api_token` and
//! `TELEGRAM_ADMIN_ID` overrides `bot.admin_chat_id`. Precedence is
//! Environment > Config file > Defaults.

use anyhow::{anyhow, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

pub const ENV_API_TOKEN: &str = "MACARON_BOT_API_TOKEN";
pub const ENV_ADMIN_ID: &str = "TELEGRAM_ADMIN_ID";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub name: String,
    /// Chat allowed to run `/admin`. Unset disables the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_chat_id: Option<i64>,
    /// Probability that `/get` makes you put the macaron back.
    #[serde(default = "default_fail_chance")]
    pub fail_chance: f64,
}

fn default_fail_chance() -> f64 {
    0.05
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Long-poll timeout passed to getUpdates (seconds)
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    #[serde(default = "default_db_file")]
    pub db_file: String,
    #[serde(default = "default_names_file")]
    pub names_file: String,
    /// Directory with the optional GIF animations. Missing directory disables them.
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
}

fn default_db_file() -> String {
    "db.json".to_string()
}

fn default_names_file() -> String {
    "names.txt".to_string()
}

fn default_images_dir() -> String {
    "./images".to_string()
}

impl StorageConfig {
    pub fn names_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.names_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            api_base: default_api_base(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Apply environment overrides on top of the loaded file.
    pub fn apply_env(self) -> Self {
        self.apply_overrides(
            std::env::var(ENV_API_TOKEN).ok(),
            std::env::var(ENV_ADMIN_ID).ok(),
        )
    }

    fn apply_overrides(mut self, token: Option<String>, admin: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.telegram.api_token = token.trim().to_string();
        }
        if let Some(raw) = admin {
            match raw.trim().parse::<i64>() {
                Ok(id) => self.bot.admin_chat_id = Some(id),
                Err(_) => warn!("Ignoring {}='{}': not a chat id", ENV_ADMIN_ID, raw),
            }
        }
        self
    }

    /// Probability clamped to `[0, 1]`; NaN counts as zero.
    pub fn fail_chance(&self) -> f64 {
        if self.bot.fail_chance.is_nan() {
            0.0
        } else {
            self.bot.fail_chance.clamp(0.0, 1.0)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bot: BotConfig {
                name: "macaronbot".to_string(),
                admin_chat_id: None,
                fail_chance: default_fail_chance(),
            },
            telegram: TelegramConfig::default(),
            storage: StorageConfig {
                data_dir: "./data".to_string(),
                db_file: default_db_file(),
                names_file: default_names_file(),
                images_dir: default_images_dir(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("macaronbot.log".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.storage.db_file, "db.json");
        assert_eq!(parsed.telegram.poll_timeout_secs, 30);
        assert_eq!(parsed.bot.admin_chat_id, None);
    }

    #[test]
    fn minimal_file_fills_defaults() {
        let text = r#"
[bot]
name = "test"

[storage]
data_dir = "/tmp/x"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.bot.fail_chance, 0.05);
        assert_eq!(config.storage.names_file, "names.txt");
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.storage.names_path(), PathBuf::from("/tmp/x/names.txt"));
    }

    #[test]
    fn env_overrides_token_and_admin() {
        let config = Config::default()
            .apply_overrides(Some(" abc:123 ".to_string()), Some("42".to_string()));
        assert_eq!(config.telegram.api_token, "abc:123");
        assert_eq!(config.bot.admin_chat_id, Some(42));
    }

    #[test]
    fn bad_admin_override_is_ignored() {
        let mut base = Config::default();
        base.bot.admin_chat_id = Some(7);
        let config = base.apply_overrides(Some("".to_string()), Some("alice".to_string()));
        assert_eq!(config.bot.admin_chat_id, Some(7));
        assert_eq!(config.telegram.api_token, "");
    }

    #[test]
    fn fail_chance_is_clamped() {
        let mut config = Config::default();
        config.bot.fail_chance = 3.0;
        assert_eq!(config.fail_chance(), 1.0);
        config.bot.fail_chance = f64::NAN;
        assert_eq!(config.fail_chance(), 0.0);
    }
}
