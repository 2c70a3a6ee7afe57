//! step_back_prompting: abstract first, then answer with the abstraction

use crate::flows::context::FlowContext;
use crate::flows::error::FlowError;
use crate::flows::strategy::{FlowStrategy, StrategyOutput};
use agora_domain::{AgenticFlowType, FlowPromptTemplate, StrategySettings};
use async_trait::async_trait;

pub struct StepBackPrompting;

#[async_trait]
impl FlowStrategy for StepBackPrompting {
    fn flow_type(&self) -> AgenticFlowType {
        AgenticFlowType::StepBackPrompting
    }

    async fn run(
        &self,
        prompt: &str,
        settings: &StrategySettings,
        ctx: &mut FlowContext<'_>,
    ) -> Result<StrategyOutput, FlowError> {
        if !matches!(settings, StrategySettings::StepBackPrompting) {
            return Err(FlowError::SettingsMismatch(self.flow_type()));
        }

        let principles = ctx
            .call("step_back", FlowPromptTemplate::step_back(prompt))
            .await?;
        let enhanced = FlowPromptTemplate::step_back_answer(prompt, principles.trim());
        let answer = ctx.call("answer", enhanced.clone()).await?;

        Ok(StrategyOutput::single(enhanced, answer).with_reasoning(Some(principles)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::testing::{ScriptedCalls, no_services, run_flow, run_strategy};
    use agora_domain::AgenticFlowConfiguration;

    #[tokio::test]
    async fn test_abstraction_feeds_answer() {
        let provider = ScriptedCalls::new(["Externalities matter.", "So ban cars."]);
        let config = AgenticFlowConfiguration::new(AgenticFlowType::StepBackPrompting);
        let (output, steps) =
            run_strategy(&StepBackPrompting, config, &provider, &no_services(), "Q").await;

        let output = output.unwrap();
        assert_eq!(output.final_response, "So ban cars.");
        assert_eq!(output.reasoning.as_deref(), Some("Externalities matter."));
        assert!(provider.prompts()[1].contains("Externalities matter."));
        assert_eq!(steps[0].step_type, "step_back");
        assert_eq!(steps[1].step_type, "answer");
    }

    #[tokio::test]
    async fn test_response_changed_against_baseline_call() {
        let config = AgenticFlowConfiguration::new(AgenticFlowType::StepBackPrompting)
            .with_param("baseline_check", true);

        let provider = ScriptedCalls::new(["Ban cars.", "Externalities matter.", "So ban cars."]);
        let result = run_flow(config.clone(), &provider, no_services(), "Q").await;
        assert!(result.response_changed);

        let provider =
            ScriptedCalls::new(["So ban cars.", "Externalities matter.", "So ban cars."]);
        let result = run_flow(config, &provider, no_services(), "Q").await;
        assert!(!result.response_changed);
        assert_eq!(result.provider_calls, 3);
    }
}
