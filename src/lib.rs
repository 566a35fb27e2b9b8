//! engram-mcp - Notion, Telegram and a local fact memory for MCP clients
//!
//! This crate exposes a small set of tools to LLM agents over the Model
//! Context Protocol: logging structured notes to Notion pages, reading them
//! back, pushing Telegram alerts and keeping a local SQLite log of facts.

pub mod config;
pub mod mcp;
pub mod memory;
pub mod notion;
pub mod telegram;
pub mod tools;
pub mod types;
pub mod utils;

pub use config::{Config, ConfigLoader};
pub use mcp::McpServer;
pub use memory::FactStore;
pub use tools::{ToolReply, Toolbox};
pub use types::EngramError;
