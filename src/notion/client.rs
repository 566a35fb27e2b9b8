//! Notion REST client
//!
//! Only the three calls the tools need: page creation, block-children append
//! and a single page of block-children listing.

use crate::config::Config;
use crate::notion::blocks::{to_children, Block};
use crate::notion::render::BlockList;
use crate::types::{EngramError, Result};
use crate::utils::{endpoint, http_client};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

pub const NOTION_VERSION: &str = "2022-06-28";

/// Result of a successful page creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedPage {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// The subset of the Notion API used by the tools.
#[async_trait]
pub trait NotionApi: Send + Sync {
    /// Create a page under `parent_id` with the given title and initial blocks.
    async fn create_page(&self, parent_id: &str, title: &str, children: &[Block])
        -> Result<CreatedPage>;

    /// Append blocks to the end of a page or block.
    async fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()>;

    /// First page of a block's immediate children.
    async fn list_children(&self, block_id: &str) -> Result<BlockList>;
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

pub struct HttpNotionClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpNotionClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            base_url: config.notion_base_url.clone(),
            api_key: config.notion_api_key.clone(),
        })
    }

    fn request<I, S>(&self, method: Method, segments: I) -> Result<RequestBuilder>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(EngramError::MissingConfig("NOTION_API_KEY"))?;
        let url = endpoint(&self.base_url, segments)?;
        debug!("Notion {} {}", method, url);

        Ok(self
            .http
            .request(method, url)
            .bearer_auth(api_key)
            .header("Notion-Version", NOTION_VERSION))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) if !body.message.is_empty() => (body.code, body.message),
            _ => (
                "unknown".to_string(),
                status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or(text),
            ),
        };

        Err(EngramError::NotionApi {
            status: status.as_u16(),
            code,
            message,
        })
    }
}

#[async_trait]
impl NotionApi for HttpNotionClient {
    async fn create_page(
        &self,
        parent_id: &str,
        title: &str,
        children: &[Block],
    ) -> Result<CreatedPage> {
        let body = json!({
            "parent": { "page_id": parent_id },
            "properties": {
                "title": [{ "text": { "content": title } }]
            },
            "children": to_children(children),
        });

        let request = self.request(Method::POST, ["pages"])?.json(&body);
        Self::send(request).await
    }

    async fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()> {
        let body = json!({ "children": to_children(children) });
        let request = self
            .request(Method::PATCH, ["blocks", block_id, "children"])?
            .json(&body);

        let response = request.send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_children(&self, block_id: &str) -> Result<BlockList> {
        let request = self.request(Method::GET, ["blocks", block_id, "children"])?;
        let list: BlockList = Self::send(request).await?;
        if list.has_more {
            debug!(
                "Block {} has more children than one page; only the first page is read",
                block_id
            );
        }
        Ok(list)
    }
}
