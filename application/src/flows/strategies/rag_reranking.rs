//! rag_with_reranking: retrieve candidates, rerank against the prompt,
//! inject the top K, single call

use crate::flows::context::FlowContext;
use crate::flows::error::FlowError;
use crate::flows::strategy::{FlowStrategy, StrategyOutput};
use crate::ports::rag_retrieval::RetrievedDocument;
use agora_domain::flow::parsing::similarity;
use agora_domain::{AgenticFlowType, FlowPromptTemplate, StrategySettings};
use async_trait::async_trait;

pub struct RagWithReranking;

/// Order candidates by word overlap with the query, then backend score.
/// Stable for equal keys, so backend order breaks remaining ties.
pub fn rerank(query: &str, mut candidates: Vec<RetrievedDocument>) -> Vec<RetrievedDocument> {
    candidates.sort_by(|a, b| {
        let sa = similarity(query, &a.content);
        let sb = similarity(query, &b.content);
        sb.total_cmp(&sa).then(b.score.total_cmp(&a.score))
    });
    candidates
}

#[async_trait]
impl FlowStrategy for RagWithReranking {
    fn flow_type(&self) -> AgenticFlowType {
        AgenticFlowType::RagWithReranking
    }

    async fn run(
        &self,
        prompt: &str,
        settings: &StrategySettings,
        ctx: &mut FlowContext<'_>,
    ) -> Result<StrategyOutput, FlowError> {
        let StrategySettings::RagWithReranking { top_k, candidates } = settings else {
            return Err(FlowError::SettingsMismatch(self.flow_type()));
        };

        let retrieved = ctx
            .retrieval()
            .retrieve(prompt, *candidates, ctx.organization())
            .await
            .map_err(|e| FlowError::Retrieval(e.to_string()))?;
        let retrieved_count = retrieved.len();

        let selected: Vec<RetrievedDocument> =
            rerank(prompt, retrieved).into_iter().take(*top_k).collect();
        let context: Vec<String> = selected.iter().map(|d| d.content.clone()).collect();

        let enhanced = if context.is_empty() {
            prompt.to_string()
        } else {
            FlowPromptTemplate::rag_context(prompt, &context)
        };
        let response = ctx.call("respond", enhanced.clone()).await?;
        ctx.record(
            "rerank",
            format!("{} candidates", retrieved_count),
            selected
                .iter()
                .map(|d| d.id.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );

        Ok(StrategyOutput::single(enhanced, response)
            .with_metric("retrieved", retrieved_count)
            .with_metric("injected", selected.len()))
    }
}
