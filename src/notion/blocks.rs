//! Outgoing block descriptors and their Notion wire shape

use crate::types::EngramError;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Longest text Notion accepts in a single rich text run.
pub const MAX_TEXT_LEN: usize = 2000;

pub const DEFAULT_CODE_LANGUAGE: &str = "plain text";

/// Content type a caller may request when appending to a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockKind {
    #[default]
    Paragraph,
    BulletedListItem,
    Code,
    Table,
}

impl BlockKind {
    pub const ALL: [BlockKind; 4] = [
        BlockKind::Paragraph,
        BlockKind::BulletedListItem,
        BlockKind::Code,
        BlockKind::Table,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::BulletedListItem => "bulleted_list_item",
            BlockKind::Code => "code",
            BlockKind::Table => "table",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = EngramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EngramError::InvalidBlockType(s.to_string()))
    }
}

/// Grid of cell strings. Every row has the same number of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
    pub has_column_header: bool,
}

impl Table {
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(String),
    Paragraph(String),
    BulletedListItem(String),
    Code { text: String, language: String },
    Table(Table),
}

impl Block {
    pub fn type_name(&self) -> &'static str {
        match self {
            Block::Heading(_) => "heading_2",
            Block::Paragraph(_) => "paragraph",
            Block::BulletedListItem(_) => "bulleted_list_item",
            Block::Code { .. } => "code",
            Block::Table(_) => "table",
        }
    }

    /// Render as a Notion block object.
    pub fn to_json(&self) -> Value {
        let body = match self {
            Block::Heading(text) | Block::Paragraph(text) | Block::BulletedListItem(text) => {
                json!({ "rich_text": rich_text(text) })
            }
            Block::Code { text, language } => json!({
                "rich_text": rich_text(text),
                "language": language,
            }),
            Block::Table(table) => {
                let width = table.width();
                let rows: Vec<Value> = table
                    .rows
                    .iter()
                    .map(|row| {
                        let cells: Vec<Value> = (0..width)
                            .map(|i| rich_text(row.get(i).map(String::as_str).unwrap_or("")))
                            .collect();
                        json!({
                            "object": "block",
                            "type": "table_row",
                            "table_row": { "cells": cells },
                        })
                    })
                    .collect();
                json!({
                    "table_width": width,
                    "has_column_header": table.has_column_header,
                    "has_row_header": false,
                    "children": rows,
                })
            }
        };

        let type_name = self.type_name();
        let mut block = json!({ "object": "block", "type": type_name });
        block[type_name] = body;
        block
    }
}

/// Render blocks for a `children` array.
pub fn to_children(blocks: &[Block]) -> Vec<Value> {
    blocks.iter().map(Block::to_json).collect()
}

/// Rich text runs for `text`, split at the per-run length limit.
pub fn rich_text(text: &str) -> Value {
    let runs: Vec<Value> = split_text(text, MAX_TEXT_LEN)
        .into_iter()
        .map(|chunk| json!({ "type": "text", "text": { "content": chunk } }))
        .collect();
    Value::Array(runs)
}

/// Split into pieces of at most `max_chars` characters.
///
/// Always returns at least one piece, so empty text yields `[""]`.
pub fn split_text(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == max_chars {
            pieces.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    pieces.push(&text[start..]);
    pieces
}
