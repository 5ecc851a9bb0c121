//! CLI configuration.

use anyhow::Result;
use riftlog_core::ObserverConfig;
use riftlog_core::config::{DEFAULT_DEDUP_WINDOW, DEFAULT_RECENCY_WINDOW};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default = "default_chat_logs_dir")]
    pub chat_logs_dir: PathBuf,
    /// Game client settings directory, checked for accounts with chat logging off
    #[serde(default)]
    pub settings_dir: Option<PathBuf>,
    #[serde(default = "default_recency_window_days")]
    pub recency_window_days: u64,
    #[serde(default = "default_dedup_window_ms")]
    pub dedup_window_ms: u64,
    /// Only print messages from these channels (all channels when empty)
    #[serde(default)]
    pub channels: Vec<String>,
}

fn default_chat_logs_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("EVE")
        .join("logs")
        .join("Chatlogs")
}

fn default_recency_window_days() -> u64 {
    DEFAULT_RECENCY_WINDOW.as_secs() / 86_400
}

fn default_dedup_window_ms() -> u64 {
    DEFAULT_DEDUP_WINDOW.as_millis() as u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chat_logs_dir: default_chat_logs_dir(),
            settings_dir: None,
            recency_window_days: default_recency_window_days(),
            dedup_window_ms: default_dedup_window_ms(),
            channels: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from default location (config/default.toml) or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }

    pub fn observer_config(&self) -> ObserverConfig {
        ObserverConfig::default()
            .with_recency_window(Duration::from_secs(self.recency_window_days * 86_400))
            .with_dedup_window(Duration::from_millis(self.dedup_window_ms))
    }

    /// Whether messages from `channel_name` should be printed.
    pub fn accepts_channel(&self, channel_name: &str) -> bool {
        self.channels.is_empty()
            || self
                .channels
                .iter()
                .any(|channel| channel.eq_ignore_ascii_case(channel_name))
    }
}
