//! Shared test doubles for the application integration tests

#![allow(dead_code)]

use agora_application::{
    DebateNotification, DebatePersistencePort, EventPublisherPort, ExecutionRepositoryPort,
    FlowRepositoryPort, GatewayError, PersistenceError, ProviderCallPort, ProviderRequest,
};
use agora_domain::{AgenticFlow, AgenticFlowExecution, Debate, DebateId, FlowId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Answers every prompt with the same text
pub struct FixedProvider {
    reply: String,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FixedProvider {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderCallPort for FixedProvider {
    async fn call(&self, _request: &ProviderRequest) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.reply.clone())
    }
}

/// Fails the first `failures` calls as if the provider were unreachable
pub struct FlakyProvider {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyProvider {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderCallPort for FlakyProvider {
    async fn call(&self, request: &ProviderRequest) -> Result<String, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(GatewayError::ConnectionError(format!(
                "{} unreachable",
                request.provider
            )));
        }
        Ok("Recovered answer.".to_string())
    }
}

/// Keeps every published notification
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<DebateNotification>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<DebateNotification> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }
}

impl EventPublisherPort for RecordingPublisher {
    fn publish(&self, event: &DebateNotification) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// In-memory store for debates, flows and executions
#[derive(Default)]
pub struct MemoryStore {
    debates: Mutex<HashMap<DebateId, Debate>>,
    flows: Mutex<HashMap<FlowId, AgenticFlow>>,
    executions: Mutex<Vec<AgenticFlowExecution>>,
}

#[async_trait]
impl DebatePersistencePort for MemoryStore {
    async fn save(&self, debate: &Debate) -> Result<(), PersistenceError> {
        self.debates
            .lock()
            .unwrap()
            .insert(debate.id(), debate.clone());
        Ok(())
    }

    async fn find(&self, id: DebateId) -> Result<Option<Debate>, PersistenceError> {
        Ok(self.debates.lock().unwrap().get(&id).cloned())
    }

    async fn list_ids(&self) -> Result<Vec<DebateId>, PersistenceError> {
        Ok(self.debates.lock().unwrap().keys().copied().collect())
    }
}

#[async_trait]
impl FlowRepositoryPort for MemoryStore {
    async fn save_flow(&self, flow: &AgenticFlow) -> Result<(), PersistenceError> {
        self.flows.lock().unwrap().insert(flow.id, flow.clone());
        Ok(())
    }

    async fn find_flow(&self, id: FlowId) -> Result<Option<AgenticFlow>, PersistenceError> {
        Ok(self.flows.lock().unwrap().get(&id).cloned())
    }

    async fn list_flows(
        &self,
        organization_id: Option<&str>,
    ) -> Result<Vec<AgenticFlow>, PersistenceError> {
        Ok(self
            .flows
            .lock()
            .unwrap()
            .values()
            .filter(|f| {
                organization_id.is_none() || f.organization_id.as_deref() == organization_id
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ExecutionRepositoryPort for MemoryStore {
    async fn append(&self, execution: &AgenticFlowExecution) -> Result<(), PersistenceError> {
        self.executions.lock().unwrap().push(execution.clone());
        Ok(())
    }

    async fn by_flow(
        &self,
        flow_id: FlowId,
    ) -> Result<Vec<AgenticFlowExecution>, PersistenceError> {
        Ok(self
            .executions
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.flow_id == Some(flow_id))
            .cloned()
            .collect())
    }

    async fn by_debate(
        &self,
        debate_id: DebateId,
    ) -> Result<Vec<AgenticFlowExecution>, PersistenceError> {
        Ok(self
            .executions
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.debate_id == Some(debate_id))
            .cloned()
            .collect())
    }
}
