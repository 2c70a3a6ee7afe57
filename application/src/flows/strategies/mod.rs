//! The twelve built-in strategies

mod confidence;
mod constitutional;
mod ensemble;
mod internal_monologue;
mod post_processing;
mod prompt_chaining;
mod rag_reranking;
mod red_team;
mod self_critique;
mod step_back;
mod tool_verification;
mod tree_of_thoughts;

pub use confidence::ConfidenceScoring;
pub use constitutional::ConstitutionalPrompting;
pub use ensemble::EnsembleVoting;
pub use internal_monologue::InternalMonologue;
pub use post_processing::{PostProcessingRules, apply_rules};
pub use prompt_chaining::PromptChaining;
pub use rag_reranking::{RagWithReranking, rerank};
pub use red_team::MultiAgentRedTeam;
pub use self_critique::SelfCritiqueLoop;
pub use step_back::StepBackPrompting;
pub use tool_verification::ToolCallingVerification;
pub use tree_of_thoughts::TreeOfThoughts;
