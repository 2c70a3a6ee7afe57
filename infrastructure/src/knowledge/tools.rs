//! Local tool executor over the knowledge base

use super::base::KnowledgeBase;
use agora_application::ports::tool_execution::{ToolExecutionError, ToolExecutionPort};
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

pub const SEARCH_NOTES: &str = "search_notes";
pub const READ_NOTE: &str = "read_note";
pub const WORD_COUNT: &str = "word_count";

/// Matching lines returned by `search_notes`
const MAX_MATCHES: usize = 20;

/// Read-only tools the tool-calling flow can use to check claims
pub struct LocalToolExecutor {
    knowledge: Arc<KnowledgeBase>,
}

impl LocalToolExecutor {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    /// Case-insensitive regex search, one `note:line: text` per match
    fn search_notes(&self, pattern: &str) -> Result<String, ToolExecutionError> {
        let pattern = pattern.trim().trim_matches('"');
        if pattern.is_empty() {
            return Err(failed(SEARCH_NOTES, "pattern is required"));
        }
        let regex = Regex::new(&format!("(?i){}", pattern))
            .map_err(|e| failed(SEARCH_NOTES, format!("Invalid regex pattern: {}", e)))?;

        let mut matches = Vec::new();
        'notes: for note in self.knowledge.notes() {
            for (line_num, line) in note.content.lines().enumerate() {
                if regex.is_match(line) {
                    matches.push(format!("{}:{}: {}", note.id, line_num + 1, line.trim()));
                    if matches.len() >= MAX_MATCHES {
                        break 'notes;
                    }
                }
            }
        }

        if matches.is_empty() {
            Ok(format!("No matches for '{}'", pattern))
        } else {
            Ok(matches.join("\n"))
        }
    }

    fn read_note(&self, id: &str) -> Result<String, ToolExecutionError> {
        let id = id.trim().trim_matches('"');
        self.knowledge
            .get(id)
            .map(|note| note.content.clone())
            .ok_or_else(|| failed(READ_NOTE, format!("No note named '{}'", id)))
    }
}

fn failed(tool: &str, message: impl Into<String>) -> ToolExecutionError {
    ToolExecutionError::Failed {
        tool: tool.to_string(),
        message: message.into(),
    }
}

#[async_trait]
impl ToolExecutionPort for LocalToolExecutor {
    fn available_tools(&self) -> Vec<String> {
        vec![
            SEARCH_NOTES.to_string(),
            READ_NOTE.to_string(),
            WORD_COUNT.to_string(),
        ]
    }

    async fn execute(&self, name: &str, arguments: &str) -> Result<String, ToolExecutionError> {
        debug!(tool = name, arguments, "Executing tool");
        match name {
            SEARCH_NOTES => self.search_notes(arguments),
            READ_NOTE => self.read_note(arguments),
            WORD_COUNT => Ok(arguments.split_whitespace().count().to_string()),
            _ => Err(ToolExecutionError::UnknownTool(name.to_string())),
        }
    }
}
