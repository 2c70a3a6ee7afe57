//! multi_agent_red_team: draft → attack → defend/revise

use crate::flows::context::FlowContext;
use crate::flows::error::FlowError;
use crate::flows::strategy::{FlowStrategy, StrategyOutput};
use agora_domain::{AgenticFlowType, FlowPromptTemplate, StrategySettings};
use async_trait::async_trait;

pub struct MultiAgentRedTeam;

#[async_trait]
impl FlowStrategy for MultiAgentRedTeam {
    fn flow_type(&self) -> AgenticFlowType {
        AgenticFlowType::MultiAgentRedTeam
    }

    async fn run(
        &self,
        prompt: &str,
        settings: &StrategySettings,
        ctx: &mut FlowContext<'_>,
    ) -> Result<StrategyOutput, FlowError> {
        if !matches!(settings, StrategySettings::MultiAgentRedTeam) {
            return Err(FlowError::SettingsMismatch(self.flow_type()));
        }

        let draft = ctx.call("draft", prompt.to_string()).await?;
        let attack = ctx
            .call("attack", FlowPromptTemplate::red_team_attack(prompt, &draft))
            .await?;
        let enhanced = FlowPromptTemplate::red_team_defend(prompt, &draft, &attack);
        let defense = ctx.call("defend", enhanced.clone()).await?;

        Ok(StrategyOutput::single(enhanced, defense)
            .with_reasoning(Some(attack.trim().to_string())))
    }
}
