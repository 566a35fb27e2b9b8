//! Notion block model, content translation and REST client

pub mod blocks;
pub mod client;
pub mod render;
pub mod translate;

pub use blocks::{Block, BlockKind, Table, DEFAULT_CODE_LANGUAGE, MAX_TEXT_LEN};
pub use client::{CreatedPage, HttpNotionClient, NotionApi};
pub use render::{BlockContent, BlockList, BlockObject};
pub use translate::{heading, paragraphs, parse_table, strip_code_fence, translate};
