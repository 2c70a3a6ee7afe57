//! Flow errors

use crate::ports::provider_call::GatewayError;
use agora_domain::{AgenticFlowType, DomainError, ExecutionId, ProcessingStep};
use thiserror::Error;

/// Failure inside a strategy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("Provider call failed: {0}")]
    Provider(#[from] GatewayError),

    #[error("Call budget of {0} provider calls exceeded")]
    CallBudgetExceeded(u32),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Provider returned an empty response at step {0}")]
    EmptyResponse(String),

    #[error("No strategy registered for {0}")]
    UnknownStrategy(AgenticFlowType),

    #[error("Settings do not match strategy {0}")]
    SettingsMismatch(AgenticFlowType),

    #[error("Invalid flow configuration: {0}")]
    Configuration(#[from] DomainError),

    #[error("Flow timed out")]
    Timeout,
}

impl FlowError {
    /// Whether running the same turn again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FlowError::Provider(e) => e.is_unavailable(),
            FlowError::Retrieval(_) | FlowError::EmptyResponse(_) | FlowError::Timeout => true,
            FlowError::CallBudgetExceeded(_)
            | FlowError::UnknownStrategy(_)
            | FlowError::SettingsMismatch(_)
            | FlowError::Configuration(_) => false,
        }
    }
}

/// A failed flow execution. Carries the steps completed before the failure.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{flow_type} flow failed: {source}")]
pub struct FlowExecutionError {
    pub flow_type: AgenticFlowType,
    #[source]
    pub source: FlowError,
    pub partial_steps: Vec<ProcessingStep>,
    pub processing_time_ms: u64,
    /// Id of the recorded error execution, when history is kept
    pub execution_id: Option<ExecutionId>,
}

impl FlowExecutionError {
    pub fn is_retryable(&self) -> bool {
        self.source.is_retryable()
    }
}
