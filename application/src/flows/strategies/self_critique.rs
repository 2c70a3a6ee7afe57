//! self_critique_loop: draft, then N critique-and-revise rounds

use crate::flows::context::FlowContext;
use crate::flows::error::FlowError;
use crate::flows::strategy::{FlowStrategy, StrategyOutput};
use agora_domain::flow::parsing::split_on_marker;
use agora_domain::prompt::REVISION_MARKER;
use agora_domain::{AgenticFlowType, FlowPromptTemplate, StrategySettings};
use async_trait::async_trait;

pub struct SelfCritiqueLoop;

#[async_trait]
impl FlowStrategy for SelfCritiqueLoop {
    fn flow_type(&self) -> AgenticFlowType {
        AgenticFlowType::SelfCritiqueLoop
    }

    async fn run(
        &self,
        prompt: &str,
        settings: &StrategySettings,
        ctx: &mut FlowContext<'_>,
    ) -> Result<StrategyOutput, FlowError> {
        let StrategySettings::SelfCritiqueLoop { iterations } = settings else {
            return Err(FlowError::SettingsMismatch(self.flow_type()));
        };

        let mut draft = ctx.call("draft", prompt.to_string()).await?.trim().to_string();
        let mut enhanced = prompt.to_string();
        let mut full_response = draft.clone();
        let mut critiques = Vec::new();

        for i in 1..=*iterations {
            enhanced = FlowPromptTemplate::critique_and_revise(prompt, &draft);
            let response = ctx
                .call(&format!("critique_{}", i), enhanced.clone())
                .await?;
            let (critique, revised) = split_on_marker(&response, REVISION_MARKER);
            if let Some(critique) = critique {
                critiques.push(format!("Iteration {}:\n{}", i, critique));
            }
            if !revised.is_empty() {
                draft = revised;
            }
            full_response = response;
        }

        let reasoning = (!critiques.is_empty()).then(|| critiques.join("\n\n"));
        Ok(StrategyOutput {
            enhanced_prompt: enhanced,
            full_response,
            final_response: draft,
            reasoning,
            ..Default::default()
        }
        .with_metric("iterations", *iterations))
    }
}
