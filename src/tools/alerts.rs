use crate::tools::{ToolReply, Toolbox};
use tracing::{error, info};

impl Toolbox {
    /// Sends a push notification through the Telegram bot.
    pub async fn send_alert(&self, message: &str) -> ToolReply {
        let Some(credentials) = self.config.telegram.as_ref() else {
            return ToolReply::error("Error: Telegram credentials not set.");
        };

        match self.notifier.send_message(credentials, message).await {
            Ok(()) => {
                info!("Alert delivered to chat {}", credentials.chat_id);
                ToolReply::ok("Alert sent successfully.")
            }
            Err(e) => {
                error!("send_alert error: {}", e);
                ToolReply::error(format!("Failed to send alert: {}", e))
            }
        }
    }
}
