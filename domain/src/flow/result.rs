//! Results of running an agentic flow

use crate::flow::flow_type::AgenticFlowType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One recorded step of a flow execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStep {
    /// Step kind, e.g. `draft`, `critique`, `branch`, `stage`
    pub step_type: String,
    pub input: String,
    pub output: String,
}

impl ProcessingStep {
    pub fn new(
        step_type: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            step_type: step_type.into(),
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Strategy-specific measurements (confidence, vote counts, scores, ...)
pub type FlowMetrics = BTreeMap<String, Value>;

/// Metric key set when a confidence-scored answer stayed below threshold
pub const LOW_CONFIDENCE_METRIC: &str = "low_confidence";

/// Output of one agentic flow execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgenticFlowResult {
    pub flow_type: AgenticFlowType,
    pub original_prompt: String,
    /// Prompt as finally sent to the model (after augmentation)
    pub enhanced_prompt: String,
    /// Raw text of the last model response
    pub full_response: String,
    /// Text handed back to the debate
    pub final_response: String,
    /// Hidden reasoning, critique or vote trail, when the flow produces one
    pub reasoning: Option<String>,
    pub processing_steps: Vec<ProcessingStep>,
    pub processing_time_ms: u64,
    /// `final_response` differs from the unaugmented baseline
    pub response_changed: bool,
    pub provider_calls: u32,
    #[serde(default)]
    pub metrics: FlowMetrics,
}

impl AgenticFlowResult {
    pub fn metric(&self, key: &str) -> Option<&Value> {
        self.metrics.get(key)
    }

    /// Whether the flow flagged its own answer (low confidence)
    pub fn is_flagged(&self) -> bool {
        self.metric(LOW_CONFIDENCE_METRIC)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
