//! Deterministic stubs shared by the strategy tests

use crate::flows::context::{FlowContext, FlowServices, FlowTarget};
use crate::flows::error::FlowError;
use crate::flows::executor::AgenticFlowExecutor;
use crate::flows::strategy::{FlowStrategy, StrategyOutput};
use crate::ports::provider_call::{GatewayError, ProviderCallPort, ProviderRequest};
use crate::ports::rag_retrieval::NoRetrieval;
use crate::ports::tool_execution::NoTools;
use agora_domain::{AgenticFlowConfiguration, AgenticFlowResult, Model, ProcessingStep};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Answers from a fixed script, in order, and records every request
pub struct ScriptedCalls {
    script: Mutex<VecDeque<Result<String, GatewayError>>>,
    pub requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedCalls {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self::with_results(responses.into_iter().map(|r| Ok(r.into())))
    }

    pub fn with_results(results: impl IntoIterator<Item = Result<String, GatewayError>>) -> Self {
        Self {
            script: Mutex::new(results.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ProviderCallPort for ScriptedCalls {
    async fn call(&self, request: &ProviderRequest) -> Result<String, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::RequestFailed("script exhausted".into())))
    }
}

pub fn no_services() -> FlowServices {
    FlowServices {
        tools: Arc::new(NoTools),
        retrieval: Arc::new(NoRetrieval),
    }
}

pub fn target() -> FlowTarget {
    FlowTarget::new("stub", Model::ClaudeSonnet45)
}

/// Run one strategy directly against a script
pub async fn run_strategy(
    strategy: &dyn FlowStrategy,
    config: AgenticFlowConfiguration,
    provider: &ScriptedCalls,
    services: &FlowServices,
    prompt: &str,
) -> (Result<StrategyOutput, FlowError>, Vec<ProcessingStep>) {
    let settings = config.settings().unwrap();
    let target = target();
    let mut ctx = FlowContext::new(provider, &target, services, settings.common.max_calls);
    let output = strategy.run(prompt, &settings.strategy, &mut ctx).await;
    (output, ctx.into_steps())
}

/// Run one flow end to end through the executor, as a debate turn does
pub async fn run_flow(
    config: AgenticFlowConfiguration,
    provider: &ScriptedCalls,
    services: FlowServices,
    prompt: &str,
) -> AgenticFlowResult {
    AgenticFlowExecutor::new(services)
        .execute(&config, prompt, provider, &target())
        .await
        .unwrap()
}
