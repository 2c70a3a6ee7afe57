//! Prompt domain
//!
//! Templates for debate turns and for each agentic flow step.

mod flow;
mod template;

pub use flow::{FlowPromptTemplate, REVISION_MARKER};
pub use template::{PromptTemplate, TranscriptEntry};
