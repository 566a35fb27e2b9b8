//! Tool operations
//!
//! Every operation takes primitive arguments and returns a [`ToolReply`]:
//! human-readable text plus an error flag. External failures are caught here
//! and turned into error replies; nothing below this layer is allowed to
//! take the server down.

mod alerts;
mod memory;
mod pages;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::Config;
use crate::memory::FactStore;
use crate::notion::{HttpNotionClient, NotionApi};
use crate::telegram::{Notifier, TelegramNotifier};
use crate::types::Result;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_RECENT_LIMIT: u32 = 5;

/// Text returned to the calling agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReply {
    pub text: String,
    pub is_error: bool,
}

impl ToolReply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

impl fmt::Display for ToolReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Everything a tool call needs: configuration, the fact log and the two
/// external APIs.
#[derive(Clone)]
pub struct Toolbox {
    config: Arc<Config>,
    store: FactStore,
    notion: Arc<dyn NotionApi>,
    notifier: Arc<dyn Notifier>,
}

impl Toolbox {
    pub fn new(
        config: Arc<Config>,
        notion: Arc<dyn NotionApi>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store = FactStore::new(config.memory_path.clone());
        Self {
            config,
            store,
            notion,
            notifier,
        }
    }

    /// Toolbox talking to the real Notion and Telegram APIs.
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let notion = Arc::new(HttpNotionClient::new(&config)?);
        let notifier = Arc::new(TelegramNotifier::new(&config)?);
        Ok(Self::new(config, notion, notifier))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &FactStore {
        &self.store
    }
}
