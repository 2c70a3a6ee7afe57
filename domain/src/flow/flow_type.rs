//! The twelve agentic flow types

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A reasoning-augmentation strategy wrapped around a raw model call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgenticFlowType {
    InternalMonologue,
    SelfCritiqueLoop,
    MultiAgentRedTeam,
    ToolCallingVerification,
    RagWithReranking,
    ConfidenceScoring,
    ConstitutionalPrompting,
    EnsembleVoting,
    PostProcessingRules,
    TreeOfThoughts,
    StepBackPrompting,
    PromptChaining,
}

impl AgenticFlowType {
    pub const ALL: [AgenticFlowType; 12] = [
        AgenticFlowType::InternalMonologue,
        AgenticFlowType::SelfCritiqueLoop,
        AgenticFlowType::MultiAgentRedTeam,
        AgenticFlowType::ToolCallingVerification,
        AgenticFlowType::RagWithReranking,
        AgenticFlowType::ConfidenceScoring,
        AgenticFlowType::ConstitutionalPrompting,
        AgenticFlowType::EnsembleVoting,
        AgenticFlowType::PostProcessingRules,
        AgenticFlowType::TreeOfThoughts,
        AgenticFlowType::StepBackPrompting,
        AgenticFlowType::PromptChaining,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgenticFlowType::InternalMonologue => "internal_monologue",
            AgenticFlowType::SelfCritiqueLoop => "self_critique_loop",
            AgenticFlowType::MultiAgentRedTeam => "multi_agent_red_team",
            AgenticFlowType::ToolCallingVerification => "tool_calling_verification",
            AgenticFlowType::RagWithReranking => "rag_with_reranking",
            AgenticFlowType::ConfidenceScoring => "confidence_scoring",
            AgenticFlowType::ConstitutionalPrompting => "constitutional_prompting",
            AgenticFlowType::EnsembleVoting => "ensemble_voting",
            AgenticFlowType::PostProcessingRules => "post_processing_rules",
            AgenticFlowType::TreeOfThoughts => "tree_of_thoughts",
            AgenticFlowType::StepBackPrompting => "step_back_prompting",
            AgenticFlowType::PromptChaining => "prompt_chaining",
        }
    }

    /// Short human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            AgenticFlowType::InternalMonologue => "hidden reasoning, then a final answer",
            AgenticFlowType::SelfCritiqueLoop => "draft, then bounded critique-and-revise rounds",
            AgenticFlowType::MultiAgentRedTeam => "draft, attack, defend",
            AgenticFlowType::ToolCallingVerification => "verify claims with tool calls",
            AgenticFlowType::RagWithReranking => "inject reranked retrieved context",
            AgenticFlowType::ConfidenceScoring => "self-reported confidence with optional retry",
            AgenticFlowType::ConstitutionalPrompting => "fixed principle preamble",
            AgenticFlowType::EnsembleVoting => "temperature-varied samples, majority vote",
            AgenticFlowType::PostProcessingRules => "deterministic rewrite rules",
            AgenticFlowType::TreeOfThoughts => "expand, score and select branches",
            AgenticFlowType::StepBackPrompting => "answer an abstracted question first",
            AgenticFlowType::PromptChaining => "ordered sub-prompts piped together",
        }
    }
}

impl std::fmt::Display for AgenticFlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgenticFlowType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        AgenticFlowType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| DomainError::config(format!("unknown agentic flow type: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_dashes_and_case() {
        assert_eq!(
            "Tree-Of-Thoughts".parse::<AgenticFlowType>().unwrap(),
            AgenticFlowType::TreeOfThoughts
        );
        assert!("mind_reading".parse::<AgenticFlowType>().is_err());
    }

    #[test]
    fn test_as_str_matches_serde() {
        for flow in AgenticFlowType::ALL {
            let json = serde_json::to_string(&flow).unwrap();
            assert_eq!(json, format!("\"{}\"", flow.as_str()));
            assert_eq!(flow.as_str().parse::<AgenticFlowType>().unwrap(), flow);
        }
    }
}
