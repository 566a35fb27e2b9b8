//! Content translation: caller text plus a block kind into Notion blocks

use crate::notion::blocks::{split_text, Block, BlockKind, Table, DEFAULT_CODE_LANGUAGE, MAX_TEXT_LEN};
use crate::types::{EngramError, Result};

/// Translate `content` into the blocks for `kind`.
///
/// Paragraphs and bulleted items longer than [`MAX_TEXT_LEN`] become several
/// consecutive blocks. Code and tables always produce exactly one block.
pub fn translate(content: &str, kind: BlockKind, language: Option<&str>) -> Result<Vec<Block>> {
    let blocks = match kind {
        BlockKind::Paragraph => paragraphs(content),
        BlockKind::BulletedListItem => split_text(content, MAX_TEXT_LEN)
            .into_iter()
            .map(|chunk| Block::BulletedListItem(chunk.to_string()))
            .collect(),
        BlockKind::Code => vec![Block::Code {
            text: strip_code_fence(content).to_string(),
            language: code_language(language),
        }],
        BlockKind::Table => vec![Block::Table(parse_table(content)?)],
    };
    Ok(blocks)
}

/// Section heading placed above appended content.
pub fn heading(title: &str) -> Block {
    Block::Heading(title.to_string())
}

/// Paragraph blocks for `content`, one per [`MAX_TEXT_LEN`] chunk.
pub fn paragraphs(content: &str) -> Vec<Block> {
    split_text(content, MAX_TEXT_LEN)
        .into_iter()
        .map(|chunk| Block::Paragraph(chunk.to_string()))
        .collect()
}

fn code_language(language: Option<&str>) -> String {
    match language.map(str::trim) {
        Some(lang) if !lang.is_empty() => lang.to_string(),
        _ => DEFAULT_CODE_LANGUAGE.to_string(),
    }
}

/// Remove a surrounding markdown code fence, if any.
///
/// The opening fence may carry a language tag (word characters, `+`, `-`).
pub fn strip_code_fence(content: &str) -> &str {
    let mut text = content.trim();

    if let Some(rest) = text.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '+' | '-')))
            .unwrap_or(rest.len());
        let rest = &rest[tag_len..];
        text = rest.strip_prefix('\n').unwrap_or(rest);
    }

    if let Some(rest) = text.strip_suffix("```") {
        text = rest.strip_suffix('\n').unwrap_or(rest);
    }

    text
}

/// A row made only of pipes, dashes, colons and whitespace, e.g. `|---|:-:|`.
fn is_separator(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_whitespace() || matches!(c, '|' | '-' | ':'))
}

fn split_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let mut cells: Vec<String> = trimmed.split('|').map(|c| c.trim().to_string()).collect();

    if trimmed.starts_with('|') && !cells.is_empty() {
        cells.remove(0);
    }
    if trimmed.ends_with('|') && !cells.is_empty() {
        cells.pop();
    }
    cells
}

/// Parse a markdown table.
///
/// A separator on the second line marks the first row as a header. Blank
/// lines are ignored. Every row is padded with empty cells to the width of
/// the widest row; nothing is truncated.
pub fn parse_table(content: &str) -> Result<Table> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut has_column_header = false;

    for (i, line) in content.trim().split('\n').enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if is_separator(line) {
            if i == 1 {
                has_column_header = true;
            }
            continue;
        }

        let cells = split_row(line);
        if !cells.is_empty() {
            rows.push(cells);
        }
    }

    if rows.is_empty() {
        return Err(EngramError::UnparseableTable);
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }

    Ok(Table {
        rows,
        has_column_header,
    })
}
