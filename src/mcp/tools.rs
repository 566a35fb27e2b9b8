//! MCP tools implementation
//!
//! Defines the tool schemas and maps `tools/call` requests onto [`Toolbox`]
//! operations.

use crate::mcp::protocol::{CallToolResult, Tool};
use crate::tools::{ToolReply, Toolbox, DEFAULT_RECENT_LIMIT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

const BLOCK_TYPES: [&str; 4] = ["paragraph", "bulleted_list_item", "code", "table"];

/// Get all tool definitions
pub fn get_tool_definitions() -> Vec<Tool> {
    vec![
        Tool {
            name: "remember_fact".to_string(),
            description: "Stores a fact in the agent's internal SQLite memory.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "fact": {
                        "type": "string",
                        "description": "The fact to remember"
                    }
                },
                "required": ["fact"]
            }),
        },
        Tool {
            name: "create_page".to_string(),
            description: "Creates a new sub-page in Notion under the configured parent page (or parent_id when given).".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "The title of the new page"
                    },
                    "content": {
                        "type": "string",
                        "description": "Optional initial paragraph content"
                    },
                    "parent_id": {
                        "type": "string",
                        "description": "Parent page ID. Defaults to NOTION_PAGE_ID"
                    }
                },
                "required": ["title"]
            }),
        },
        Tool {
            name: "update_page".to_string(),
            description: "Appends a heading and a content block to a specific Notion page.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "page_id": {
                        "type": "string",
                        "description": "The ID of the Notion page to update"
                    },
                    "title": {
                        "type": "string",
                        "description": "The heading for the new section"
                    },
                    "content": {
                        "type": "string",
                        "description": "The content to append. Markdown table syntax for 'table'"
                    },
                    "type": {
                        "type": "string",
                        "enum": BLOCK_TYPES,
                        "default": "paragraph",
                        "description": "Block type for the content"
                    },
                    "language": {
                        "type": "string",
                        "default": "plain text",
                        "description": "Language for code blocks (e.g. 'python', 'mermaid')"
                    }
                },
                "required": ["page_id", "title", "content"]
            }),
        },
        Tool {
            name: "log_to_notion".to_string(),
            description: "Logs an entry to the default Notion page (or page_id when given).".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "The heading for the new section"
                    },
                    "content": {
                        "type": "string",
                        "description": "The content to append"
                    },
                    "type": {
                        "type": "string",
                        "enum": BLOCK_TYPES,
                        "default": "paragraph"
                    },
                    "language": {
                        "type": "string",
                        "default": "plain text"
                    },
                    "page_id": {
                        "type": "string",
                        "description": "Target page ID. Defaults to NOTION_PAGE_ID"
                    }
                },
                "required": ["title", "content"]
            }),
        },
        Tool {
            name: "list_sub_pages".to_string(),
            description: "Lists the immediate sub-pages of a parent page.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "parent_id": {
                        "type": "string",
                        "description": "Parent page ID. Defaults to NOTION_PAGE_ID"
                    }
                }
            }),
        },
        Tool {
            name: "read_page_content".to_string(),
            description: "Reads the top-level blocks of a Notion page and returns a simplified text representation.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "page_id": {
                        "type": "string",
                        "description": "The ID of the page to read"
                    }
                },
                "required": ["page_id"]
            }),
        },
        Tool {
            name: "send_alert".to_string(),
            description: "Sends a push notification via Telegram.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "Text of the notification"
                    }
                },
                "required": ["message"]
            }),
        },
        Tool {
            name: "search_memory".to_string(),
            description: "Searches the agent's internal memory for facts containing the query.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search term to look for"
                    }
                },
                "required": ["query"]
            }),
        },
        Tool {
            name: "get_recent_memories".to_string(),
            description: "Retrieves the most recent memories from the agent's internal database.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "minimum": 0,
                        "default": DEFAULT_RECENT_LIMIT,
                        "description": "Number of memories to retrieve"
                    }
                }
            }),
        },
    ]
}

/// Call a tool by name
pub async fn call_tool(name: &str, arguments: Option<Value>, toolbox: &Toolbox) -> CallToolResult {
    let args = arguments.unwrap_or_else(|| json!({}));
    debug!("Calling tool {} with {}", name, args);

    let reply = match name {
        "remember_fact" => match parse_args::<RememberFactArgs>(args) {
            Ok(a) => toolbox.remember_fact(&a.fact),
            Err(e) => e,
        },
        "create_page" => match parse_args::<CreatePageArgs>(args) {
            Ok(a) => {
                toolbox
                    .create_page(&a.title, a.content.as_deref(), a.parent_id.as_deref())
                    .await
            }
            Err(e) => e,
        },
        "update_page" => match parse_args::<UpdatePageArgs>(args) {
            Ok(a) => {
                toolbox
                    .update_page(
                        &a.page_id,
                        &a.title,
                        &a.content,
                        &a.kind,
                        a.language.as_deref(),
                    )
                    .await
            }
            Err(e) => e,
        },
        "log_to_notion" => match parse_args::<LogToNotionArgs>(args) {
            Ok(a) => {
                toolbox
                    .log_to_notion(
                        &a.title,
                        &a.content,
                        &a.kind,
                        a.language.as_deref(),
                        a.page_id.as_deref(),
                    )
                    .await
            }
            Err(e) => e,
        },
        "list_sub_pages" => match parse_args::<ListSubPagesArgs>(args) {
            Ok(a) => toolbox.list_sub_pages(a.parent_id.as_deref()).await,
            Err(e) => e,
        },
        "read_page_content" => match parse_args::<ReadPageArgs>(args) {
            Ok(a) => toolbox.read_page_content(&a.page_id).await,
            Err(e) => e,
        },
        "send_alert" => match parse_args::<SendAlertArgs>(args) {
            Ok(a) => toolbox.send_alert(&a.message).await,
            Err(e) => e,
        },
        "search_memory" => match parse_args::<SearchMemoryArgs>(args) {
            Ok(a) => toolbox.search_memory(&a.query),
            Err(e) => e,
        },
        "get_recent_memories" => match parse_args::<RecentMemoriesArgs>(args) {
            Ok(a) => toolbox.get_recent_memories(a.limit),
            Err(e) => e,
        },
        _ => {
            warn!("Unknown tool requested: {}", name);
            ToolReply::error(format!("Unknown tool: {}", name))
        }
    };

    CallToolResult::text(reply.text, reply.is_error)
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolReply> {
    serde_json::from_value(args).map_err(|e| ToolReply::error(format!("Invalid arguments: {}", e)))
}

fn default_kind() -> String {
    "paragraph".to_string()
}

fn default_limit() -> u32 {
    DEFAULT_RECENT_LIMIT
}

#[derive(Debug, Deserialize)]
struct RememberFactArgs {
    fact: String,
}

#[derive(Debug, Deserialize)]
struct CreatePageArgs {
    title: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdatePageArgs {
    page_id: String,
    title: String,
    content: String,
    #[serde(rename = "type", default = "default_kind")]
    kind: String,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LogToNotionArgs {
    title: String,
    content: String,
    #[serde(rename = "type", default = "default_kind")]
    kind: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    page_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListSubPagesArgs {
    #[serde(default)]
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReadPageArgs {
    page_id: String,
}

#[derive(Debug, Deserialize)]
struct SendAlertArgs {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SearchMemoryArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
struct RecentMemoriesArgs {
    #[serde(default = "default_limit")]
    limit: u32,
}
