//! post_processing_rules: one call, then deterministic rewrite rules

use crate::flows::context::FlowContext;
use crate::flows::error::FlowError;
use crate::flows::strategy::{FlowStrategy, StrategyOutput};
use agora_domain::{AgenticFlowType, RewriteRule, StrategySettings};
use async_trait::async_trait;

pub struct PostProcessingRules;

/// Apply rules in order, then trim, then cut to `max_length` characters
pub fn apply_rules(
    text: &str,
    rules: &[RewriteRule],
    trim: bool,
    max_length: Option<usize>,
) -> String {
    let mut out = rules
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc));
    if trim {
        out = out.trim().to_string();
    }
    if let Some(max) = max_length
        && out.chars().count() > max
    {
        out = out.chars().take(max).collect();
        if trim {
            out = out.trim_end().to_string();
        }
    }
    out
}

#[async_trait]
impl FlowStrategy for PostProcessingRules {
    fn flow_type(&self) -> AgenticFlowType {
        AgenticFlowType::PostProcessingRules
    }

    async fn run(
        &self,
        prompt: &str,
        settings: &StrategySettings,
        ctx: &mut FlowContext<'_>,
    ) -> Result<StrategyOutput, FlowError> {
        let StrategySettings::PostProcessingRules {
            rules,
            trim,
            max_length,
        } = settings
        else {
            return Err(FlowError::SettingsMismatch(self.flow_type()));
        };

        let response = ctx.call("respond", prompt.to_string()).await?;
        let processed = apply_rules(&response, rules, *trim, *max_length);
        ctx.record("post_process", response.clone(), processed.clone());

        Ok(StrategyOutput {
            enhanced_prompt: prompt.to_string(),
            full_response: response,
            final_response: processed,
            ..Default::default()
        }
        .with_metric("rules", rules.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::testing::{ScriptedCalls, no_services, run_flow, run_strategy};
    use agora_domain::AgenticFlowConfiguration;
    use serde_json::json;

    #[tokio::test]
    async fn test_rules_apply_after_call() {
        let provider = ScriptedCalls::new(["  As an AI, I think cars   are bad.  "]);
        let config = AgenticFlowConfiguration::new(AgenticFlowType::PostProcessingRules)
            .with_param(
                "rules",
                json!([
                    { "pattern": "As an AI, ", "replacement": "" },
                    { "pattern": "\\s+", "replacement": " " }
                ]),
            );
        let (output, steps) =
            run_strategy(&PostProcessingRules, config, &provider, &no_services(), "Q").await;

        let output = output.unwrap();
        assert_eq!(output.final_response, "I think cars are bad.");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].step_type, "post_process");
    }

    #[test]
    fn test_max_length_counts_chars() {
        assert_eq!(apply_rules("héllo wörld", &[], true, Some(5)), "héllo");
        assert_eq!(apply_rules(" keep ", &[], false, None), " keep ");
    }

    #[tokio::test]
    async fn test_response_changed_only_when_rules_rewrite() {
        let rules = AgenticFlowConfiguration::new(AgenticFlowType::PostProcessingRules)
            .with_param("rules", json!([{ "pattern": "As an AI, ", "replacement": "" }]));
        let provider = ScriptedCalls::new(["As an AI, I think cars are bad."]);
        let result = run_flow(rules.clone(), &provider, no_services(), "Q").await;
        assert!(result.response_changed);
        assert_eq!(result.final_response, "I think cars are bad.");

        let provider = ScriptedCalls::new(["Cars are bad."]);
        let result = run_flow(rules, &provider, no_services(), "Q").await;
        assert!(!result.response_changed);
    }
}
