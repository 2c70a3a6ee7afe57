//! Tool execution port
//!
//! Tools let the tool_calling_verification flow check claims (search,
//! calculator, ...). Implementations live in the infrastructure layer.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolExecutionError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool {tool} failed: {message}")]
    Failed { tool: String, message: String },
}

/// Port for tool execution
#[async_trait]
pub trait ToolExecutionPort: Send + Sync {
    /// Names of all available tools
    fn available_tools(&self) -> Vec<String>;

    fn has_tool(&self, name: &str) -> bool {
        self.available_tools().iter().any(|t| t == name)
    }

    /// Run a tool and return its textual output
    async fn execute(&self, name: &str, arguments: &str) -> Result<String, ToolExecutionError>;
}

/// No tools available
pub struct NoTools;

#[async_trait]
impl ToolExecutionPort for NoTools {
    fn available_tools(&self) -> Vec<String> {
        Vec::new()
    }

    async fn execute(&self, name: &str, _arguments: &str) -> Result<String, ToolExecutionError> {
        Err(ToolExecutionError::UnknownTool(name.to_string()))
    }
}
