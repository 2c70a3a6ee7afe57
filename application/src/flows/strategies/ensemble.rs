//! ensemble_voting: N temperature-varied samples, majority vote

use crate::flows::context::FlowContext;
use crate::flows::error::FlowError;
use crate::flows::strategy::{FlowStrategy, StrategyOutput};
use agora_domain::{AgenticFlowType, EnsembleTally, StrategySettings};
use async_trait::async_trait;
use tracing::debug;

pub struct EnsembleVoting;

#[async_trait]
impl FlowStrategy for EnsembleVoting {
    fn flow_type(&self) -> AgenticFlowType {
        AgenticFlowType::EnsembleVoting
    }

    async fn run(
        &self,
        prompt: &str,
        settings: &StrategySettings,
        ctx: &mut FlowContext<'_>,
    ) -> Result<StrategyOutput, FlowError> {
        let StrategySettings::EnsembleVoting {
            ensemble_size,
            temperatures,
            similarity_threshold,
        } = settings
        else {
            return Err(FlowError::SettingsMismatch(self.flow_type()));
        };

        // Samples are drawn in order so the vote is reproducible
        let mut samples = Vec::with_capacity(*ensemble_size);
        for (i, temperature) in temperatures.iter().take(*ensemble_size).enumerate() {
            let sample = ctx
                .call_with_temperature(
                    &format!("sample_{}", i + 1),
                    prompt.to_string(),
                    *temperature,
                )
                .await?;
            samples.push(sample.trim().to_string());
        }

        let tally = EnsembleTally::from_samples(&samples, *similarity_threshold)
            .ok_or_else(|| FlowError::EmptyResponse("ensemble".to_string()))?;
        let winner = samples[tally.winning_sample()].clone();
        debug!(
            votes = tally.winning_votes(),
            total = tally.total_votes,
            summary = %tally.vote_summary(),
            "Ensemble vote"
        );
        ctx.record(
            "vote",
            format!("{} samples", samples.len()),
            format!("{} {}", tally.vote_summary(), winner),
        );

        let reasoning = format!(
            "{} of {} samples agreed {}",
            tally.winning_votes(),
            tally.total_votes,
            tally.vote_summary()
        );
        Ok(StrategyOutput {
            enhanced_prompt: prompt.to_string(),
            full_response: samples.last().cloned().unwrap_or_default(),
            final_response: winner,
            reasoning: Some(reasoning),
            ..Default::default()
        }
        .with_metric("votes", tally.winning_votes())
        .with_metric("samples", tally.total_votes)
        .with_metric("clusters", tally.clusters.len())
        .with_metric("agreement", tally.agreement_ratio())
        .with_metric("majority", tally.has_majority()))
    }
}
