use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngramError {
    #[error("{0} not set in environment variables.")]
    MissingConfig(&'static str),

    #[error("Notion API error ({status} {code}): {message}")]
    NotionApi {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Telegram API error ({status}): {message}")]
    Telegram { status: u16, message: String },

    #[error("Invalid type '{0}'. Must be 'paragraph', 'bulleted_list_item', 'code', or 'table'.")]
    InvalidBlockType(String),

    #[error("Could not parse table content.")]
    UnparseableTable,

    #[error("Configuration error in {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngramError>;
