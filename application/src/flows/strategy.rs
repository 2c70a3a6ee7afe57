//! The strategy interface shared by all twelve flows

use crate::flows::context::FlowContext;
use crate::flows::error::FlowError;
use agora_domain::{AgenticFlowType, FlowMetrics, StrategySettings};
use async_trait::async_trait;

/// What a strategy hands back to the executor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyOutput {
    /// Prompt as finally sent to the model
    pub enhanced_prompt: String,
    /// Raw text of the last model response
    pub full_response: String,
    pub final_response: String,
    pub reasoning: Option<String>,
    pub metrics: FlowMetrics,
}

impl StrategyOutput {
    /// Output where the last raw response is also the final answer
    pub fn single(enhanced_prompt: String, response: String) -> Self {
        Self {
            enhanced_prompt,
            final_response: response.trim().to_string(),
            full_response: response,
            ..Default::default()
        }
    }

    pub fn with_reasoning(mut self, reasoning: Option<String>) -> Self {
        self.reasoning = reasoning;
        self
    }

    pub fn with_metric(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metrics.insert(key.to_string(), value.into());
        self
    }
}

/// A stateless reasoning-augmentation strategy
///
/// Strategies are parameterized only by their settings and reach the
/// provider through the [`FlowContext`]; they keep no state between runs.
#[async_trait]
pub trait FlowStrategy: Send + Sync {
    fn flow_type(&self) -> AgenticFlowType;

    async fn run(
        &self,
        prompt: &str,
        settings: &StrategySettings,
        ctx: &mut FlowContext<'_>,
    ) -> Result<StrategyOutput, FlowError>;
}
