//! Persistence ports
//!
//! The storage technology is an external concern; adapters translate the
//! aggregates to and from rows.

use agora_domain::{AgenticFlow, AgenticFlowExecution, Debate, DebateId, FlowId};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Saves and loads debate aggregates
#[async_trait]
pub trait DebatePersistencePort: Send + Sync {
    /// Insert or replace the snapshot of a debate
    async fn save(&self, debate: &Debate) -> Result<(), PersistenceError>;

    async fn find(&self, id: DebateId) -> Result<Option<Debate>, PersistenceError>;

    async fn list_ids(&self) -> Result<Vec<DebateId>, PersistenceError>;
}

/// Stored flow configurations (`agentic_flows`)
#[async_trait]
pub trait FlowRepositoryPort: Send + Sync {
    async fn save_flow(&self, flow: &AgenticFlow) -> Result<(), PersistenceError>;

    async fn find_flow(&self, id: FlowId) -> Result<Option<AgenticFlow>, PersistenceError>;

    async fn list_flows(
        &self,
        organization_id: Option<&str>,
    ) -> Result<Vec<AgenticFlow>, PersistenceError>;
}

/// Append-only flow execution history (`agentic_flow_executions`)
#[async_trait]
pub trait ExecutionRepositoryPort: Send + Sync {
    async fn append(&self, execution: &AgenticFlowExecution) -> Result<(), PersistenceError>;

    /// Executions of a stored flow, oldest first
    async fn by_flow(&self, flow_id: FlowId) -> Result<Vec<AgenticFlowExecution>, PersistenceError>;

    /// Executions run for a debate, oldest first
    async fn by_debate(
        &self,
        debate_id: DebateId,
    ) -> Result<Vec<AgenticFlowExecution>, PersistenceError>;
}
