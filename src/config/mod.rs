//! Configuration system for engram-mcp
//!
//! Provides a 3-tier configuration hierarchy:
//! 1. Process environment, including a `.env` file (highest priority)
//! 2. User config file (`config.toml`)
//! 3. Built-in defaults (lowest priority)
//!
//! The result is an immutable [`Config`] built once at startup and handed to
//! every tool operation.

mod loader;
mod user_config;

pub use loader::{default_memory_path, ConfigLoader};
pub use user_config::UserConfig;

use std::fmt;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com/v1/";
pub const DEFAULT_TELEGRAM_BASE_URL: &str = "https://api.telegram.org/";

/// Both Telegram values needed to deliver an alert.
#[derive(Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    /// Notion integration secret
    pub notion_api_key: Option<String>,

    /// Default parent page for page creation, logging and listing
    pub notion_page_id: Option<String>,

    /// Present only when both the bot token and chat id are configured
    pub telegram: Option<TelegramCredentials>,

    /// SQLite file backing the fact log
    pub memory_path: PathBuf,

    pub notion_base_url: Url,
    pub telegram_base_url: Url,
}

impl Config {
    /// A config with nothing but defaults and the given fact-log path.
    pub fn with_memory_path(memory_path: impl Into<PathBuf>) -> Self {
        Self {
            notion_api_key: None,
            notion_page_id: None,
            telegram: None,
            memory_path: memory_path.into(),
            notion_base_url: Url::parse(DEFAULT_NOTION_BASE_URL).expect("valid default URL"),
            telegram_base_url: Url::parse(DEFAULT_TELEGRAM_BASE_URL).expect("valid default URL"),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "notion_api_key",
                &self.notion_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("notion_page_id", &self.notion_page_id)
            .field("telegram", &self.telegram)
            .field("memory_path", &self.memory_path)
            .field("notion_base_url", &self.notion_base_url.as_str())
            .field("telegram_base_url", &self.telegram_base_url.as_str())
            .finish()
    }
}
