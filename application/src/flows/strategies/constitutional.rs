//! constitutional_prompting: principle preamble, one call

use crate::flows::context::FlowContext;
use crate::flows::error::FlowError;
use crate::flows::strategy::{FlowStrategy, StrategyOutput};
use agora_domain::{AgenticFlowType, FlowPromptTemplate, StrategySettings};
use async_trait::async_trait;

pub struct ConstitutionalPrompting;

#[async_trait]
impl FlowStrategy for ConstitutionalPrompting {
    fn flow_type(&self) -> AgenticFlowType {
        AgenticFlowType::ConstitutionalPrompting
    }

    async fn run(
        &self,
        prompt: &str,
        settings: &StrategySettings,
        ctx: &mut FlowContext<'_>,
    ) -> Result<StrategyOutput, FlowError> {
        let StrategySettings::ConstitutionalPrompting { principles } = settings else {
            return Err(FlowError::SettingsMismatch(self.flow_type()));
        };

        let enhanced = FlowPromptTemplate::constitutional(prompt, principles);
        let response = ctx.call("respond", enhanced.clone()).await?;
        Ok(StrategyOutput::single(enhanced, response).with_metric("principles", principles.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::testing::{ScriptedCalls, no_services, run_strategy};
    use agora_domain::AgenticFlowConfiguration;
    use serde_json::json;

    #[tokio::test]
    async fn test_custom_principles_are_injected() {
        let provider = ScriptedCalls::new(["principled answer"]);
        let config = AgenticFlowConfiguration::new(AgenticFlowType::ConstitutionalPrompting)
            .with_param("principles", json!(["Cite a source."]));
        let (output, steps) =
            run_strategy(&ConstitutionalPrompting, config, &provider, &no_services(), "Q").await;

        assert_eq!(output.unwrap().final_response, "principled answer");
        assert_eq!(steps.len(), 1);
        assert!(provider.prompts()[0].starts_with("Follow these principles"));
        assert!(provider.prompts()[0].contains("1. Cite a source."));
    }
}
