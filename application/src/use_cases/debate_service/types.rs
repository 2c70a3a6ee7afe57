//! Type definitions for the debate service.

use crate::flows::error::FlowExecutionError;
use crate::ports::persistence::PersistenceError;
use crate::ports::provider_call::GatewayError;
use agora_domain::{AgenticFlowConfiguration, DebateId, DomainError, FlowId};
use thiserror::Error;

/// Errors returned by the debate service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DebateServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Debate not found: {0}")]
    NotFound(DebateId),

    #[error("Agentic flow not found: {0}")]
    FlowNotFound(FlowId),

    #[error("Agentic flow {0} is disabled")]
    FlowDisabled(FlowId),

    #[error(transparent)]
    Flow(#[from] FlowExecutionError),

    #[error("Provider call failed: {0}")]
    Provider(#[from] GatewayError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("No provider or model binding for {0}")]
    NoProviderBinding(String),
}

impl DebateServiceError {
    /// Whether the same call may succeed if repeated.
    ///
    /// Domain rejections (bad transition, duplicate or late turn) are caller
    /// misuse and never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            DebateServiceError::Flow(e) => e.is_retryable(),
            DebateServiceError::Provider(e) => e.is_unavailable(),
            DebateServiceError::Persistence(_) => true,
            DebateServiceError::Domain(_)
            | DebateServiceError::NotFound(_)
            | DebateServiceError::FlowNotFound(_)
            | DebateServiceError::FlowDisabled(_)
            | DebateServiceError::NoProviderBinding(_) => false,
        }
    }

    /// A turn lost a race with another submission or with round closing
    pub fn is_turn_race(&self) -> bool {
        matches!(self, DebateServiceError::Domain(e) if e.is_turn_race())
    }
}

/// What a participant hands in for a turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnInput {
    /// Content written by the participant
    Content(String),
    /// Content generated by the participant's model
    Flow(FlowRequest),
}

impl TurnInput {
    pub fn content(text: impl Into<String>) -> Self {
        TurnInput::Content(text.into())
    }

    /// Generate with the participant's own flow (or a plain call if none)
    pub fn generate() -> Self {
        TurnInput::Flow(FlowRequest::default())
    }
}

/// Which flow generates a turn
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FlowSelection {
    /// The flow the participant joined with; a plain model call when none
    #[default]
    Participant,
    Inline(AgenticFlowConfiguration),
    /// A stored `agentic_flows` entry (must be active)
    Stored(FlowId),
}

/// A request to generate a turn through the participant's model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowRequest {
    pub flow: FlowSelection,
    /// Prompt override. Defaults to the debate turn prompt with transcript.
    pub prompt: Option<String>,
}

impl FlowRequest {
    pub fn inline(config: AgenticFlowConfiguration) -> Self {
        Self {
            flow: FlowSelection::Inline(config),
            prompt: None,
        }
    }

    pub fn stored(flow_id: FlowId) -> Self {
        Self {
            flow: FlowSelection::Stored(flow_id),
            prompt: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}
