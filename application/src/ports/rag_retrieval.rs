//! RAG retrieval port
//!
//! Document ingestion and vector search live outside this system; the
//! rag_with_reranking flow only needs candidate passages for a query.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalError {
    #[error("Retrieval backend unavailable: {0}")]
    Unavailable(String),

    #[error("Retrieval failed: {0}")]
    Failed(String),
}

/// A candidate passage returned by the retrieval backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub id: String,
    pub content: String,
    /// Backend relevance score (higher is better)
    pub score: f64,
}

impl RetrievedDocument {
    pub fn new(id: impl Into<String>, content: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            score,
        }
    }
}

/// Port for retrieving context passages
#[async_trait]
pub trait RagRetrievalPort: Send + Sync {
    /// Return up to `limit` candidates for `query`, best first
    async fn retrieve(
        &self,
        query: &str,
        limit: usize,
        organization: Option<&str>,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError>;
}

/// Retrieval backend with no documents
pub struct NoRetrieval;

#[async_trait]
impl RagRetrievalPort for NoRetrieval {
    async fn retrieve(
        &self,
        _query: &str,
        _limit: usize,
        _organization: Option<&str>,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        Ok(Vec::new())
    }
}
