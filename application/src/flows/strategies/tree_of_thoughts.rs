//! tree_of_thoughts: K candidate branches per level, each scored by the
//! model; the best branch seeds the next level

use crate::flows::context::FlowContext;
use crate::flows::error::FlowError;
use crate::flows::strategy::{FlowStrategy, StrategyOutput};
use agora_domain::flow::parsing::parse_branch_score;
use agora_domain::{AgenticFlowType, FlowPromptTemplate, StrategySettings};
use async_trait::async_trait;

pub struct TreeOfThoughts;

struct Branch {
    prompt: String,
    answer: String,
    score: f64,
}

#[async_trait]
impl FlowStrategy for TreeOfThoughts {
    fn flow_type(&self) -> AgenticFlowType {
        AgenticFlowType::TreeOfThoughts
    }

    async fn run(
        &self,
        prompt: &str,
        settings: &StrategySettings,
        ctx: &mut FlowContext<'_>,
    ) -> Result<StrategyOutput, FlowError> {
        let StrategySettings::TreeOfThoughts { branches, depth } = settings else {
            return Err(FlowError::SettingsMismatch(self.flow_type()));
        };

        let mut best: Option<Branch> = None;
        let mut explored = 0usize;

        for level in 1..=*depth {
            let basis = best.as_ref().map(|b| b.answer.clone());
            let mut candidates = Vec::with_capacity(*branches);
            for i in 1..=*branches {
                let branch_prompt =
                    FlowPromptTemplate::branch(prompt, i, *branches, basis.as_deref());
                let answer = ctx
                    .call(&format!("branch_{}_{}", level, i), branch_prompt.clone())
                    .await?;
                candidates.push((branch_prompt, answer));
            }

            for (i, (branch_prompt, answer)) in candidates.into_iter().enumerate() {
                let verdict = ctx
                    .call(
                        &format!("score_{}_{}", level, i + 1),
                        FlowPromptTemplate::score_branch(prompt, &answer),
                    )
                    .await?;
                let score = parse_branch_score(&verdict);
                explored += 1;
                // Strictly greater keeps the earliest branch on ties
                if best.as_ref().is_none_or(|b| score > b.score) {
                    best = Some(Branch {
                        prompt: branch_prompt,
                        answer,
                        score,
                    });
                }
            }
        }

        let best = best.ok_or_else(|| FlowError::EmptyResponse("tree_of_thoughts".to_string()))?;
        let reasoning = format!("Best of {} branches scored {:.1}/10", explored, best.score);
        Ok(StrategyOutput::single(best.prompt, best.answer)
            .with_reasoning(Some(reasoning))
            .with_metric("branches_explored", explored)
            .with_metric("best_score", best.score))
    }
}
