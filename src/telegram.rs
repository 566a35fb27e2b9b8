//! Telegram push notifications

use crate::config::{Config, TelegramCredentials};
use crate::types::{EngramError, Result};
use crate::utils::{endpoint, http_client};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to the configured chat.
    async fn send_message(&self, credentials: &TelegramCredentials, text: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct BotApiError {
    #[serde(default)]
    description: Option<String>,
}

/// Bot API client for `sendMessage`.
pub struct TelegramNotifier {
    http: reqwest::Client,
    base_url: Url,
}

impl TelegramNotifier {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            base_url: config.telegram_base_url.clone(),
        })
    }

    fn send_message_url(&self, bot_token: &str) -> Result<Url> {
        endpoint(
            &self.base_url,
            [format!("bot{}", bot_token).as_str(), "sendMessage"],
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_message(&self, credentials: &TelegramCredentials, text: &str) -> Result<()> {
        // The URL carries the bot token and must stay out of error text
        let url = self.send_message_url(&credentials.bot_token)?;
        debug!("Sending Telegram message to chat {}", credentials.chat_id);

        let response = self
            .http
            .post(url)
            .json(&json!({ "chat_id": credentials.chat_id, "text": text }))
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<BotApiError>(&body)
            .ok()
            .and_then(|e| e.description)
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

        Err(EngramError::Telegram {
            status: status.as_u16(),
            message,
        })
    }
}
