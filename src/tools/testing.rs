//! In-memory fakes of the external APIs for tool tests

use crate::config::{Config, TelegramCredentials};
use crate::notion::{Block, BlockList, CreatedPage, NotionApi};
use crate::telegram::Notifier;
use crate::tools::Toolbox;
use crate::types::{EngramError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub const PAGE_URL: &str = "https://www.notion.so/New-Page-0123abcd";

#[derive(Debug, Clone, PartialEq)]
pub enum NotionCall {
    CreatePage {
        parent_id: String,
        title: String,
        children: Vec<Block>,
    },
    Append {
        block_id: String,
        children: Vec<Block>,
    },
    List {
        block_id: String,
    },
}

#[derive(Default)]
pub struct FakeNotion {
    calls: Mutex<Vec<NotionCall>>,
    failure: Option<(u16, String)>,
    children: Vec<Value>,
}

impl FakeNotion {
    pub fn failing(status: u16, message: &str) -> Self {
        Self {
            failure: Some((status, message.to_string())),
            ..Self::default()
        }
    }

    pub fn with_children(children: Vec<Value>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<NotionCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: NotionCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some((status, message)) => Err(EngramError::NotionApi {
                status: *status,
                code: "object_not_found".to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl NotionApi for FakeNotion {
    async fn create_page(
        &self,
        parent_id: &str,
        title: &str,
        children: &[Block],
    ) -> Result<CreatedPage> {
        self.record(NotionCall::CreatePage {
            parent_id: parent_id.to_string(),
            title: title.to_string(),
            children: children.to_vec(),
        })?;
        Ok(CreatedPage {
            id: "0123abcd".to_string(),
            url: Some(PAGE_URL.to_string()),
        })
    }

    async fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()> {
        self.record(NotionCall::Append {
            block_id: block_id.to_string(),
            children: children.to_vec(),
        })
    }

    async fn list_children(&self, block_id: &str) -> Result<BlockList> {
        self.record(NotionCall::List {
            block_id: block_id.to_string(),
        })?;
        Ok(serde_json::from_value(json!({
            "object": "list",
            "results": self.children,
            "has_more": false,
            "next_cursor": null
        }))?)
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl FakeNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// (chat id, text) pairs delivered so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send_message(&self, credentials: &TelegramCredentials, text: &str) -> Result<()> {
        if self.fail {
            return Err(EngramError::Telegram {
                status: 400,
                message: "Bad Request: chat not found".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((credentials.chat_id.clone(), text.to_string()));
        Ok(())
    }
}

pub struct Harness {
    pub toolbox: Toolbox,
    pub notion: Arc<FakeNotion>,
    pub notifier: Arc<FakeNotifier>,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub fn facts(&self) -> Vec<String> {
        let mut facts = self.toolbox.store().recent(u32::MAX).unwrap();
        facts.reverse();
        facts.into_iter().map(|f| f.content).collect()
    }
}

/// Fully configured toolbox over fakes; `adjust` can remove settings.
pub fn harness_with(
    notion: FakeNotion,
    notifier: FakeNotifier,
    adjust: impl FnOnce(&mut Config),
) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::with_memory_path(dir.path().join("memory.db"));
    config.notion_api_key = Some("secret_test".to_string());
    config.notion_page_id = Some("default-page".to_string());
    config.telegram = Some(TelegramCredentials {
        bot_token: "42:token".to_string(),
        chat_id: "1001".to_string(),
    });
    adjust(&mut config);

    let notion = Arc::new(notion);
    let notifier = Arc::new(notifier);
    let toolbox = Toolbox::new(Arc::new(config), notion.clone(), notifier.clone());

    Harness {
        toolbox,
        notion,
        notifier,
        _dir: dir,
    }
}

pub fn harness() -> Harness {
    harness_with(FakeNotion::default(), FakeNotifier::default(), |_| {})
}
