//! confidence_scoring: ask for a self-reported confidence, re-call once
//! when it falls below the threshold

use crate::flows::context::FlowContext;
use crate::flows::error::FlowError;
use crate::flows::strategy::{FlowStrategy, StrategyOutput};
use agora_domain::flow::LOW_CONFIDENCE_METRIC;
use agora_domain::flow::parsing::{parse_confidence, strip_confidence_line};
use agora_domain::{AgenticFlowType, FlowPromptTemplate, StrategySettings};
use async_trait::async_trait;

pub struct ConfidenceScoring;

#[async_trait]
impl FlowStrategy for ConfidenceScoring {
    fn flow_type(&self) -> AgenticFlowType {
        AgenticFlowType::ConfidenceScoring
    }

    async fn run(
        &self,
        prompt: &str,
        settings: &StrategySettings,
        ctx: &mut FlowContext<'_>,
    ) -> Result<StrategyOutput, FlowError> {
        let StrategySettings::ConfidenceScoring {
            threshold,
            recall_below_threshold,
        } = settings
        else {
            return Err(FlowError::SettingsMismatch(self.flow_type()));
        };

        let mut enhanced = FlowPromptTemplate::confidence(prompt);
        let mut response = ctx.call("respond", enhanced.clone()).await?;
        // An answer without a parseable score counts as zero confidence
        let mut confidence = parse_confidence(&response).unwrap_or(0.0);
        let mut recalled = false;

        if confidence < *threshold && *recall_below_threshold {
            let retry_prompt = FlowPromptTemplate::confidence_retry(prompt, &response, confidence);
            let retry = ctx.call("recall", retry_prompt.clone()).await?;
            let retry_confidence = parse_confidence(&retry).unwrap_or(0.0);
            recalled = true;
            if retry_confidence >= confidence {
                enhanced = retry_prompt;
                response = retry;
                confidence = retry_confidence;
            }
        }

        let low = confidence < *threshold;
        let answer = strip_confidence_line(&response);
        Ok(StrategyOutput {
            enhanced_prompt: enhanced,
            full_response: response,
            final_response: answer,
            ..Default::default()
        }
        .with_metric("confidence", confidence)
        .with_metric("threshold", *threshold)
        .with_metric("recalled", recalled)
        .with_metric(LOW_CONFIDENCE_METRIC, low))
    }
}
