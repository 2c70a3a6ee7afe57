//! prompt_chaining: a fixed pipeline of stage templates, each stage fed
//! the previous stage's output verbatim

use crate::flows::context::FlowContext;
use crate::flows::error::FlowError;
use crate::flows::strategy::{FlowStrategy, StrategyOutput};
use agora_domain::{AgenticFlowType, FlowPromptTemplate, StrategySettings};
use async_trait::async_trait;

pub struct PromptChaining;

#[async_trait]
impl FlowStrategy for PromptChaining {
    fn flow_type(&self) -> AgenticFlowType {
        AgenticFlowType::PromptChaining
    }

    async fn run(
        &self,
        prompt: &str,
        settings: &StrategySettings,
        ctx: &mut FlowContext<'_>,
    ) -> Result<StrategyOutput, FlowError> {
        let StrategySettings::PromptChaining { stages } = settings else {
            return Err(FlowError::SettingsMismatch(self.flow_type()));
        };

        let mut previous: Option<String> = None;
        let mut last_prompt = prompt.to_string();
        for (i, template) in stages.iter().enumerate() {
            last_prompt = FlowPromptTemplate::chain_stage(template, prompt, previous.as_deref());
            let output = ctx
                .call(&format!("stage_{}", i + 1), last_prompt.clone())
                .await?;
            previous = Some(output);
        }

        let response =
            previous.ok_or_else(|| FlowError::EmptyResponse("prompt_chaining".to_string()))?;
        Ok(StrategyOutput::single(last_prompt, response).with_metric("stages", stages.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::testing::{ScriptedCalls, no_services, run_strategy};
    use agora_domain::AgenticFlowConfiguration;
    use serde_json::json;

    #[tokio::test]
    async fn test_three_stages_pipe_outputs() {
        let provider = ScriptedCalls::new(["outline", "draft", "final"]);
        let config = AgenticFlowConfiguration::new(AgenticFlowType::PromptChaining).with_param(
            "stages",
            json!(["Outline: {prompt}", "Draft from {previous}", "Polish {previous}"]),
        );
        let (output, steps) =
            run_strategy(&PromptChaining, config, &provider, &no_services(), "ban cars?").await;

        assert_eq!(output.unwrap().final_response, "final");
        assert_eq!(
            provider.prompts(),
            vec!["Outline: ban cars?", "Draft from outline", "Polish draft"]
        );
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[2].step_type, "stage_3");
    }

    #[tokio::test]
    async fn test_failing_stage_keeps_earlier_steps() {
        let provider = ScriptedCalls::new(["outline"]);
        let config = AgenticFlowConfiguration::new(AgenticFlowType::PromptChaining).with_param(
            "stages",
            json!(["Outline: {prompt}", "Draft from {previous}"]),
        );
        let (output, steps) =
            run_strategy(&PromptChaining, config, &provider, &no_services(), "q").await;

        assert!(matches!(output, Err(FlowError::Provider(_))));
        assert_eq!(steps.len(), 1);
    }
}
