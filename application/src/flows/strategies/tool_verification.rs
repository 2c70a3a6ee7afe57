//! tool_calling_verification: let the model request tools, run them, and
//! re-prompt with the results

use crate::flows::context::FlowContext;
use crate::flows::error::FlowError;
use crate::flows::strategy::{FlowStrategy, StrategyOutput};
use agora_domain::flow::parsing::{parse_tool_calls, strip_tool_calls};
use agora_domain::{AgenticFlowType, FlowPromptTemplate, StrategySettings};
use async_trait::async_trait;
use tracing::warn;

pub struct ToolCallingVerification;

#[async_trait]
impl FlowStrategy for ToolCallingVerification {
    fn flow_type(&self) -> AgenticFlowType {
        AgenticFlowType::ToolCallingVerification
    }

    async fn run(
        &self,
        prompt: &str,
        settings: &StrategySettings,
        ctx: &mut FlowContext<'_>,
    ) -> Result<StrategyOutput, FlowError> {
        let StrategySettings::ToolCallingVerification {
            tool_marker,
            max_tool_calls,
        } = settings
        else {
            return Err(FlowError::SettingsMismatch(self.flow_type()));
        };

        let tools = ctx.tools().available_tools();
        let enhanced = FlowPromptTemplate::tool_instructions(prompt, tool_marker, &tools);
        let response = ctx.call("respond", enhanced.clone()).await?;

        let calls = parse_tool_calls(&response, tool_marker);
        if calls.is_empty() {
            let answer = strip_tool_calls(&response, tool_marker);
            return Ok(StrategyOutput {
                enhanced_prompt: enhanced,
                full_response: response,
                final_response: answer,
                ..Default::default()
            }
            .with_metric("tool_calls", 0));
        }

        let mut results = Vec::new();
        for call in calls.iter().take(*max_tool_calls) {
            let label = format!("{}({})", call.name, call.arguments);
            // Tool errors are evidence for the model, not a flow failure
            let output = match ctx.tools().execute(&call.name, &call.arguments).await {
                Ok(output) => output,
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "Tool call failed");
                    format!("error: {}", e)
                }
            };
            ctx.record("tool", label.clone(), output.clone());
            results.push((label, output));
        }

        let followup = FlowPromptTemplate::tool_followup(prompt, &response, &results);
        let verified = ctx.call("verify", followup.clone()).await?;
        let answer = strip_tool_calls(&verified, tool_marker);

        Ok(StrategyOutput {
            enhanced_prompt: followup,
            full_response: verified,
            final_response: answer,
            reasoning: Some(
                results
                    .iter()
                    .map(|(call, output)| format!("{} → {}", call, output))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            ..Default::default()
        }
        .with_metric("tool_calls", results.len())
        .with_metric("tool_calls_requested", calls.len()))
    }
}
