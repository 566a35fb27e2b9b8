use crate::memory::Fact;
use crate::tools::{ToolReply, Toolbox};
use tracing::{error, info, warn};

fn bullet_list(facts: &[Fact]) -> String {
    facts
        .iter()
        .map(|fact| format!("- {}", fact.content))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Toolbox {
    /// Stores a fact in the local memory.
    pub fn remember_fact(&self, fact: &str) -> ToolReply {
        match self.store.remember(fact) {
            Ok(id) => {
                info!("Remembered fact #{}", id);
                ToolReply::ok(format!("Remembered: {}", fact))
            }
            Err(e) => {
                error!("remember_fact error: {}", e);
                ToolReply::error(format!("Error remembering fact: {}", e))
            }
        }
    }

    /// Facts containing `query`, oldest first.
    pub fn search_memory(&self, query: &str) -> ToolReply {
        match self.store.search(query) {
            Ok(facts) if facts.is_empty() => ToolReply::ok("No matching memories found."),
            Ok(facts) => ToolReply::ok(bullet_list(&facts)),
            Err(e) => {
                error!("search_memory error: {}", e);
                ToolReply::error(format!("Error searching memory: {}", e))
            }
        }
    }

    /// The `limit` most recent facts, newest first.
    pub fn get_recent_memories(&self, limit: u32) -> ToolReply {
        match self.store.recent(limit) {
            Ok(facts) if facts.is_empty() => ToolReply::ok("No memories found."),
            Ok(facts) => ToolReply::ok(bullet_list(&facts)),
            Err(e) => {
                error!("get_recent_memories error: {}", e);
                ToolReply::error(format!("Error retrieving recent memories: {}", e))
            }
        }
    }

    /// Best-effort audit entry; a failed write is logged and otherwise ignored.
    pub(crate) fn audit(&self, entry: &str) {
        if let Err(e) = self.store.remember(entry) {
            warn!("Failed to write audit entry: {}", e);
        }
    }
}
