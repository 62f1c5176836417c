//! Configuration loader and validator for the news notifier.
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::source;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub sources: Sources,
    #[serde(default)]
    pub store: Store,
    pub notify: Notify,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
}

/// Sites to poll on every run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sources {
    pub sites: Vec<String>,
}

/// Dedup store settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Store {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            location: None,
            retention_days: default_retention_days(),
        }
    }
}

fn default_retention_days() -> u32 {
    7
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Telegram,
    Webhook,
}

/// Notification delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notify {
    pub transport: Transport,
    pub target: String,
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub header: Option<String>,
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    pub fn retention(&self) -> Duration {
        Duration::days(i64::from(self.store.retention_days))
    }

    /// Store URL: `DATABASE_URL` wins, then `store.location`, then a file in `app.data_dir`.
    pub fn store_location(&self) -> String {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                return url;
            }
        }
        match &self.store.location {
            Some(loc) if !loc.trim().is_empty() => loc.clone(),
            _ => format!(
                "sqlite://{}/news-notifier.db",
                self.app.data_dir.trim_end_matches('/')
            ),
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }

    if cfg.sources.sites.is_empty() {
        return Err(ConfigError::Invalid("sources.sites must list at least one site"));
    }
    if cfg.sources.sites.iter().any(|s| !source::is_known(s)) {
        return Err(ConfigError::Invalid("sources.sites contains an unknown site"));
    }

    if cfg.store.retention_days == 0 {
        return Err(ConfigError::Invalid("store.retention_days must be > 0"));
    }

    if cfg.notify.target.trim().is_empty() {
        return Err(ConfigError::Invalid("notify.target must be non-empty"));
    }
    match cfg.notify.transport {
        Transport::Telegram => {
            let token = cfg.notify.bot_token.as_deref().unwrap_or("");
            if token.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "notify.bot_token is required for the telegram transport",
                ));
            }
        }
        Transport::Webhook => {
            let target = cfg.notify.target.trim();
            if !(target.starts_with("http://") || target.starts_with("https://")) {
                return Err(ConfigError::Invalid(
                    "notify.target must be an http(s) URL for the webhook transport",
                ));
            }
        }
    }

    Ok(())
}

/// Returns a complete example configuration.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"

sources:
  sites:
    - natalie

store:
  location: "sqlite://./data/news-notifier.db"
  retention_days: 7

notify:
  transport: telegram
  target: "-1001234567890"
  bot_token: "YOUR_TELEGRAM_BOT_TOKEN"
  header: "新着ニュース:"
"#
}
