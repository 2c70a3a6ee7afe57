//! In-process repositories.
//!
//! Rows are kept as serialized JSON, so every save and load goes through the
//! same translation a database adapter would perform.

use agora_application::ports::persistence::{
    DebatePersistencePort, ExecutionRepositoryPort, FlowRepositoryPort, PersistenceError,
};
use agora_domain::{AgenticFlow, AgenticFlowExecution, Debate, DebateId, FlowId};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn to_row<T: Serialize>(value: &T) -> Result<String, PersistenceError> {
    serde_json::to_string(value).map_err(|e| PersistenceError::Serialization(e.to_string()))
}

fn from_row<T: DeserializeOwned>(row: &str) -> Result<T, PersistenceError> {
    serde_json::from_str(row).map_err(|e| PersistenceError::Serialization(e.to_string()))
}

/// Debates, flows and executions held in memory
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    debates: Mutex<HashMap<DebateId, String>>,
    flows: Mutex<HashMap<FlowId, String>>,
    /// Append order is preserved
    executions: Mutex<Vec<ExecutionRow>>,
}

#[derive(Debug)]
struct ExecutionRow {
    flow_id: Option<FlowId>,
    debate_id: Option<DebateId>,
    json: String,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debate_count(&self) -> usize {
        lock(&self.debates).len()
    }

    pub fn execution_count(&self) -> usize {
        lock(&self.executions).len()
    }

    fn executions_where(
        &self,
        matches: impl Fn(&ExecutionRow) -> bool,
    ) -> Result<Vec<AgenticFlowExecution>, PersistenceError> {
        lock(&self.executions)
            .iter()
            .filter(|row| matches(row))
            .map(|row| from_row(&row.json))
            .collect()
    }
}

#[async_trait]
impl DebatePersistencePort for InMemoryRepository {
    async fn save(&self, debate: &Debate) -> Result<(), PersistenceError> {
        let row = to_row(debate)?;
        lock(&self.debates).insert(debate.id(), row);
        Ok(())
    }

    async fn find(&self, id: DebateId) -> Result<Option<Debate>, PersistenceError> {
        lock(&self.debates)
            .get(&id)
            .map(|row| from_row(row))
            .transpose()
    }

    async fn list_ids(&self) -> Result<Vec<DebateId>, PersistenceError> {
        let mut ids: Vec<DebateId> = lock(&self.debates).keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl FlowRepositoryPort for InMemoryRepository {
    async fn save_flow(&self, flow: &AgenticFlow) -> Result<(), PersistenceError> {
        let row = to_row(flow)?;
        lock(&self.flows).insert(flow.id, row);
        Ok(())
    }

    async fn find_flow(&self, id: FlowId) -> Result<Option<AgenticFlow>, PersistenceError> {
        lock(&self.flows)
            .get(&id)
            .map(|row| from_row(row))
            .transpose()
    }

    async fn list_flows(
        &self,
        organization_id: Option<&str>,
    ) -> Result<Vec<AgenticFlow>, PersistenceError> {
        let rows: Vec<String> = lock(&self.flows).values().cloned().collect();
        let mut flows = rows
            .iter()
            .map(|row| from_row::<AgenticFlow>(row))
            .collect::<Result<Vec<_>, _>>()?;
        flows.retain(|f| {
            organization_id.is_none_or(|org| f.organization_id.as_deref() == Some(org))
        });
        flows.sort_by_key(|f| f.created_at);
        Ok(flows)
    }
}

#[async_trait]
impl ExecutionRepositoryPort for InMemoryRepository {
    async fn append(&self, execution: &AgenticFlowExecution) -> Result<(), PersistenceError> {
        let json = to_row(execution)?;
        lock(&self.executions).push(ExecutionRow {
            flow_id: execution.flow_id,
            debate_id: execution.debate_id,
            json,
        });
        Ok(())
    }

    async fn by_flow(
        &self,
        flow_id: FlowId,
    ) -> Result<Vec<AgenticFlowExecution>, PersistenceError> {
        self.executions_where(|row| row.flow_id == Some(flow_id))
    }

    async fn by_debate(
        &self,
        debate_id: DebateId,
    ) -> Result<Vec<AgenticFlowExecution>, PersistenceError> {
        self.executions_where(|row| row.debate_id == Some(debate_id))
    }
}
