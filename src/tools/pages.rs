use crate::notion::{self, render, BlockKind};
use crate::tools::{ToolReply, Toolbox};
use crate::utils::preview;
use tracing::{error, info};

const PAGE_ID_NOT_SET: &str = "Error: NOTION_PAGE_ID not set in environment variables.";

fn explicit(id: Option<&str>) -> Option<&str> {
    id.map(str::trim).filter(|id| !id.is_empty())
}

impl Toolbox {
    /// The given page id, or the configured default page.
    fn target_page<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        explicit(requested).or(self.config.notion_page_id.as_deref())
    }

    /// Creates a sub-page, by default under the configured parent page.
    pub async fn create_page(
        &self,
        title: &str,
        content: Option<&str>,
        parent_id: Option<&str>,
    ) -> ToolReply {
        let Some(parent_id) = self.target_page(parent_id) else {
            return ToolReply::error(PAGE_ID_NOT_SET);
        };

        let children = match content {
            Some(content) if !content.is_empty() => notion::paragraphs(content),
            _ => Vec::new(),
        };

        match self.notion.create_page(parent_id, title, &children).await {
            Ok(page) => {
                let url = page.url.unwrap_or_else(|| "URL not found".to_string());
                info!("Created page '{}' under {}", title, parent_id);
                self.audit(&format!("Created Notion Page: {} - {}", title, url));
                ToolReply::ok(format!(
                    "Successfully created page '{}'. URL: {}",
                    title, url
                ))
            }
            Err(e) => {
                error!("create_page error: {}", e);
                ToolReply::error(format!("Error creating page: {}", e))
            }
        }
    }

    /// Appends a heading and one content section to a page.
    ///
    /// The request is written to the fact log before anything else, so an
    /// entry exists even when validation or the API call fails.
    pub async fn update_page(
        &self,
        page_id: &str,
        title: &str,
        content: &str,
        kind: &str,
        language: Option<&str>,
    ) -> ToolReply {
        self.audit(&format!(
            "Updated Page {} - Title: {}, Content: {}",
            page_id, title, content
        ));

        let kind: BlockKind = match kind.parse() {
            Ok(kind) => kind,
            Err(e) => return ToolReply::error(format!("Error: {}", e)),
        };

        let mut children = vec![notion::heading(title)];
        match notion::translate(content, kind, language) {
            Ok(blocks) => children.extend(blocks),
            Err(e) => return ToolReply::error(format!("Error: {}", e)),
        }

        info!(
            "Appending {} block(s) to {}: {}",
            children.len(),
            page_id,
            preview(title, 60)
        );

        match self.notion.append_children(page_id, &children).await {
            Ok(()) => ToolReply::ok(format!("Successfully updated page {}: {}", page_id, title)),
            Err(e) => {
                error!("update_page error: {}", e);
                ToolReply::error(format!("Error updating page: {}", e))
            }
        }
    }

    /// [`update_page`](Self::update_page) against the configured default page.
    pub async fn log_to_notion(
        &self,
        title: &str,
        content: &str,
        kind: &str,
        language: Option<&str>,
        page_id: Option<&str>,
    ) -> ToolReply {
        let Some(page_id) = self.target_page(page_id) else {
            return ToolReply::error(PAGE_ID_NOT_SET);
        };
        self.update_page(page_id, title, content, kind, language).await
    }

    /// Immediate child pages of a page. No recursion, first page of results only.
    pub async fn list_sub_pages(&self, parent_id: Option<&str>) -> ToolReply {
        let Some(parent_id) = self.target_page(parent_id) else {
            return ToolReply::error("Error: NOTION_PAGE_ID not set and no parent_id provided.");
        };

        match self.notion.list_children(parent_id).await {
            Ok(list) => match render::render_child_pages(&list.results) {
                Some(pages) => ToolReply::ok(pages),
                None => ToolReply::ok("No sub-pages found."),
            },
            Err(e) => {
                error!("list_sub_pages error: {}", e);
                ToolReply::error(format!("Error listing sub-pages: {}", e))
            }
        }
    }

    /// Plain text summary of a page's top-level blocks.
    pub async fn read_page_content(&self, page_id: &str) -> ToolReply {
        match self.notion.list_children(page_id).await {
            Ok(list) => match render::render_page(&list.results) {
                Some(text) => ToolReply::ok(text),
                None => ToolReply::ok("Page is empty or contains unsupported block types."),
            },
            Err(e) => {
                error!("read_page_content error: {}", e);
                ToolReply::error(format!("Error reading page: {}", e))
            }
        }
    }
}
