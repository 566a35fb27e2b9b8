use crate::types::Result;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A single logged text entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub id: i64,
    pub content: String,
}

/// Handle on the fact log file.
///
/// Holds only the path: every call opens its own connection, runs one
/// statement and drops the connection again.
#[derive(Debug, Clone)]
pub struct FactStore {
    path: PathBuf,
}

impl FactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS facts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT
            );",
        )?;
        Ok(conn)
    }

    /// Create the table if the file is new.
    pub fn init(&self) -> Result<()> {
        self.connect().map(drop)
    }

    /// Append a fact and return its id.
    pub fn remember(&self, content: &str) -> Result<i64> {
        let conn = self.connect()?;
        conn.execute("INSERT INTO facts (content) VALUES (?1)", params![content])?;
        let id = conn.last_insert_rowid();
        debug!("Stored fact #{}", id);
        Ok(id)
    }

    /// Facts containing `query`, oldest first.
    ///
    /// Matching is SQLite `LIKE`: case-insensitive for ASCII. `%` and `_` in
    /// the query are escaped so they match literally.
    pub fn search(&self, query: &str) -> Result<Vec<Fact>> {
        let conn = self.connect()?;
        let pattern = format!("%{}%", escape_like(query));
        let mut stmt = conn.prepare(
            "SELECT id, content FROM facts WHERE content LIKE ?1 ESCAPE '\\' ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![pattern], row_to_fact)?;
        let facts = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(facts)
    }

    /// The `limit` most recent facts, newest first.
    pub fn recent(&self, limit: u32) -> Result<Vec<Fact>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT id, content FROM facts ORDER BY id DESC LIMIT ?1")?;

        let rows = stmt.query_map(params![limit], row_to_fact)?;
        let facts = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(facts)
    }
}

fn row_to_fact(row: &rusqlite::Row<'_>) -> rusqlite::Result<Fact> {
    Ok(Fact {
        id: row.get(0)?,
        content: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
    })
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
