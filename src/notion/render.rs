//! Incoming block listings and their plain text rendering

use serde::Deserialize;

/// One page of results from `GET /blocks/{id}/children`.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockList {
    #[serde(default)]
    pub results: Vec<BlockObject>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockObject {
    pub id: String,
    #[serde(flatten)]
    pub content: BlockContent,
}

/// The block kinds this server knows how to read back.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum BlockContent {
    #[serde(rename = "paragraph")]
    Paragraph { paragraph: TextBody },
    #[serde(rename = "heading_1")]
    Heading1 { heading_1: TextBody },
    #[serde(rename = "heading_2")]
    Heading2 { heading_2: TextBody },
    #[serde(rename = "heading_3")]
    Heading3 { heading_3: TextBody },
    #[serde(rename = "bulleted_list_item")]
    BulletedListItem { bulleted_list_item: TextBody },
    #[serde(rename = "code")]
    Code { code: CodeBody },
    #[serde(rename = "child_page")]
    ChildPage { child_page: ChildPageBody },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub rich_text: Vec<RichTextItem>,
}

impl TextBody {
    pub fn plain_text(&self) -> String {
        self.rich_text.iter().map(|t| t.plain_text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichTextItem {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeBody {
    #[serde(default)]
    pub rich_text: Vec<RichTextItem>,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChildPageBody {
    #[serde(default)]
    pub title: String,
}

impl BlockObject {
    /// Plain text line(s) for this block, or `None` when there is nothing to show.
    pub fn render(&self) -> Option<String> {
        match &self.content {
            BlockContent::Paragraph { paragraph } => {
                let text = paragraph.plain_text();
                (!text.is_empty()).then_some(text)
            }
            BlockContent::Heading1 { heading_1: body } => render_heading("HEADING_1", body),
            BlockContent::Heading2 { heading_2: body } => render_heading("HEADING_2", body),
            BlockContent::Heading3 { heading_3: body } => render_heading("HEADING_3", body),
            BlockContent::BulletedListItem { bulleted_list_item } => {
                let text = bulleted_list_item.plain_text();
                (!text.is_empty()).then(|| format!("- {}", text))
            }
            BlockContent::Code { code } => {
                let text: String = code.rich_text.iter().map(|t| t.plain_text.as_str()).collect();
                Some(format!("```{}\n{}\n```", code.language, text))
            }
            BlockContent::ChildPage { .. } | BlockContent::Unsupported => None,
        }
    }
}

fn render_heading(label: &str, body: &TextBody) -> Option<String> {
    let text = body.plain_text();
    (!text.is_empty()).then(|| format!("[{}] {}", label, text))
}

/// Text summary of a page's top-level blocks, in order.
pub fn render_page(blocks: &[BlockObject]) -> Option<String> {
    let parts: Vec<String> = blocks.iter().filter_map(BlockObject::render).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

/// One `- title (ID: id)` line per child page.
pub fn render_child_pages(blocks: &[BlockObject]) -> Option<String> {
    let pages: Vec<String> = blocks
        .iter()
        .filter_map(|block| match &block.content {
            BlockContent::ChildPage { child_page } => {
                Some(format!("- {} (ID: {})", child_page.title, block.id))
            }
            _ => None,
        })
        .collect();

    if pages.is_empty() {
        None
    } else {
        Some(pages.join("\n"))
    }
}
