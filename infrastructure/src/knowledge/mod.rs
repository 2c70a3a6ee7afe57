//! Local knowledge base and the tool and retrieval adapters built on it

mod base;
mod retrieval;
mod tools;

pub use base::{KnowledgeBase, KnowledgeError, Note};
pub use retrieval::KeywordRetriever;
pub use tools::{LocalToolExecutor, READ_NOTE, SEARCH_NOTES, WORD_COUNT};
