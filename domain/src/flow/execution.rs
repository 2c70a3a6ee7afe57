//! Stored flows, execution history and statistics

use crate::core::error::DomainError;
use crate::core::ids::{DebateId, ExecutionId, FlowId, ParticipantId};
use crate::flow::config::AgenticFlowConfiguration;
use crate::flow::flow_type::AgenticFlowType;
use crate::flow::result::{AgenticFlowResult, ProcessingStep};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a stored flow may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStatus {
    Active,
    Disabled,
}

/// A named, validated flow configuration (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgenticFlow {
    pub id: FlowId,
    pub organization_id: Option<String>,
    pub name: String,
    pub configuration: AgenticFlowConfiguration,
    pub status: FlowStatus,
    pub created_at: DateTime<Utc>,
}

impl AgenticFlow {
    /// Create a flow. Fails with a configuration error when the parameters
    /// do not validate, so stored flows always parse at execution time.
    pub fn new(
        name: impl Into<String>,
        organization_id: Option<String>,
        configuration: AgenticFlowConfiguration,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::config("flow name cannot be empty"));
        }
        configuration.validate()?;
        Ok(Self {
            id: FlowId::new(),
            organization_id,
            name,
            configuration,
            status: FlowStatus::Active,
            created_at: now,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == FlowStatus::Active
    }
}

/// One run of a flow. Append-only; never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgenticFlowExecution {
    pub id: ExecutionId,
    pub flow_id: Option<FlowId>,
    pub flow_type: AgenticFlowType,
    pub debate_id: Option<DebateId>,
    pub participant_id: Option<ParticipantId>,
    pub prompt: String,
    /// Full result payload; `None` when the execution failed
    pub result: Option<AgenticFlowResult>,
    /// Steps completed before a failure (empty on success, see `result`)
    #[serde(default)]
    pub partial_steps: Vec<ProcessingStep>,
    pub processing_time_ms: u64,
    pub response_changed: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Who an execution was run for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionScope {
    pub flow_id: Option<FlowId>,
    pub debate_id: Option<DebateId>,
    pub participant_id: Option<ParticipantId>,
}

impl AgenticFlowExecution {
    pub fn succeeded(
        scope: ExecutionScope,
        prompt: impl Into<String>,
        result: AgenticFlowResult,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ExecutionId::new(),
            flow_id: scope.flow_id,
            flow_type: result.flow_type,
            debate_id: scope.debate_id,
            participant_id: scope.participant_id,
            prompt: prompt.into(),
            processing_time_ms: result.processing_time_ms,
            response_changed: result.response_changed,
            result: Some(result),
            partial_steps: Vec::new(),
            error_message: None,
            created_at: now,
        }
    }

    pub fn failed(
        scope: ExecutionScope,
        flow_type: AgenticFlowType,
        prompt: impl Into<String>,
        partial_steps: Vec<ProcessingStep>,
        processing_time_ms: u64,
        error_message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ExecutionId::new(),
            flow_id: scope.flow_id,
            flow_type,
            debate_id: scope.debate_id,
            participant_id: scope.participant_id,
            prompt: prompt.into(),
            result: None,
            partial_steps,
            processing_time_ms,
            response_changed: false,
            error_message: Some(error_message.into()),
            created_at: now,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }

    /// Steps recorded by this execution, successful or not
    pub fn steps(&self) -> &[ProcessingStep] {
        match &self.result {
            Some(result) => &result.processing_steps,
            None => &self.partial_steps,
        }
    }
}

/// Aggregate numbers over a flow's execution history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowStatistics {
    pub executions: usize,
    pub errors: usize,
    pub changed: usize,
    pub average_processing_time_ms: f64,
    pub last_executed_at: Option<DateTime<Utc>>,
}

impl FlowStatistics {
    pub fn from_executions<'a>(
        executions: impl IntoIterator<Item = &'a AgenticFlowExecution>,
    ) -> Self {
        let mut stats = FlowStatistics::default();
        let mut total_ms: u64 = 0;
        for execution in executions {
            stats.executions += 1;
            total_ms += execution.processing_time_ms;
            if execution.is_error() {
                stats.errors += 1;
            }
            if execution.response_changed {
                stats.changed += 1;
            }
            if stats
                .last_executed_at
                .is_none_or(|last| execution.created_at > last)
            {
                stats.last_executed_at = Some(execution.created_at);
            }
        }
        if stats.executions > 0 {
            stats.average_processing_time_ms = total_ms as f64 / stats.executions as f64;
        }
        stats
    }

    /// Share of successful executions whose response changed (0.0 to 1.0)
    pub fn change_rate(&self) -> f64 {
        let succeeded = self.executions - self.errors;
        if succeeded == 0 {
            0.0
        } else {
            self.changed as f64 / succeeded as f64
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.executions == 0 {
            0.0
        } else {
            self.errors as f64 / self.executions as f64
        }
    }
}
