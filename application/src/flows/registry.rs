//! Flow type to strategy lookup

use crate::flows::strategies::*;
use crate::flows::strategy::FlowStrategy;
use agora_domain::AgenticFlowType;
use std::collections::HashMap;
use std::sync::Arc;

/// Strategies by flow type
#[derive(Clone, Default)]
pub struct FlowRegistry {
    strategies: HashMap<AgenticFlowType, Arc<dyn FlowStrategy>>,
}

impl FlowRegistry {
    /// Registry with every built-in strategy
    pub fn with_default_strategies() -> Self {
        let mut registry = Self::default();
        registry.register(Arc::new(InternalMonologue));
        registry.register(Arc::new(SelfCritiqueLoop));
        registry.register(Arc::new(MultiAgentRedTeam));
        registry.register(Arc::new(ToolCallingVerification));
        registry.register(Arc::new(RagWithReranking));
        registry.register(Arc::new(ConfidenceScoring));
        registry.register(Arc::new(ConstitutionalPrompting));
        registry.register(Arc::new(EnsembleVoting));
        registry.register(Arc::new(PostProcessingRules));
        registry.register(Arc::new(TreeOfThoughts));
        registry.register(Arc::new(StepBackPrompting));
        registry.register(Arc::new(PromptChaining));
        registry
    }

    /// Add or replace the strategy for its flow type
    pub fn register(&mut self, strategy: Arc<dyn FlowStrategy>) {
        self.strategies.insert(strategy.flow_type(), strategy);
    }

    pub fn get(&self, flow_type: AgenticFlowType) -> Option<Arc<dyn FlowStrategy>> {
        self.strategies.get(&flow_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl std::fmt::Debug for FlowRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.strategies.keys().map(|t| t.as_str()).collect();
        types.sort_unstable();
        f.debug_struct("FlowRegistry").field("strategies", &types).finish()
    }
}
