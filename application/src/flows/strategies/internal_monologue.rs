//! internal_monologue: hidden reasoning, then a final answer after a marker

use crate::flows::context::FlowContext;
use crate::flows::error::FlowError;
use crate::flows::strategy::{FlowStrategy, StrategyOutput};
use agora_domain::flow::parsing::split_on_marker;
use agora_domain::{AgenticFlowType, FlowPromptTemplate, StrategySettings};
use async_trait::async_trait;

pub struct InternalMonologue;

#[async_trait]
impl FlowStrategy for InternalMonologue {
    fn flow_type(&self) -> AgenticFlowType {
        AgenticFlowType::InternalMonologue
    }

    async fn run(
        &self,
        prompt: &str,
        settings: &StrategySettings,
        ctx: &mut FlowContext<'_>,
    ) -> Result<StrategyOutput, FlowError> {
        let StrategySettings::InternalMonologue { marker } = settings else {
            return Err(FlowError::SettingsMismatch(self.flow_type()));
        };

        let enhanced = FlowPromptTemplate::internal_monologue(prompt, marker);
        let response = ctx.call("monologue", enhanced.clone()).await?;
        let (reasoning, answer) = split_on_marker(&response, marker);
        let marker_found = reasoning.is_some() || answer != response.trim();

        Ok(StrategyOutput {
            enhanced_prompt: enhanced,
            final_response: answer,
            full_response: response,
            reasoning,
            ..Default::default()
        }
        .with_metric("marker_found", marker_found))
    }
}
