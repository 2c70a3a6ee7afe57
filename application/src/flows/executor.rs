//! Agentic flow executor
//!
//! Resolves a configuration to its strategy, runs it inside a fresh
//! [`FlowContext`], and assembles the [`AgenticFlowResult`]. When an
//! execution repository is attached, every run (success or failure) is
//! appended to the history.

use crate::flows::context::{FlowContext, FlowServices, FlowTarget};
use crate::flows::error::{FlowError, FlowExecutionError};
use crate::flows::registry::FlowRegistry;
use crate::ports::persistence::ExecutionRepositoryPort;
use crate::ports::provider_call::ProviderCallPort;
use agora_domain::{
    AgenticFlowConfiguration, AgenticFlowExecution, AgenticFlowResult, AgenticFlowType,
    ExecutionId, ExecutionScope, ProcessingStep,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};

pub struct AgenticFlowExecutor {
    registry: FlowRegistry,
    services: FlowServices,
    executions: Option<Arc<dyn ExecutionRepositoryPort>>,
}

impl AgenticFlowExecutor {
    pub fn new(services: FlowServices) -> Self {
        Self {
            registry: FlowRegistry::with_default_strategies(),
            services,
            executions: None,
        }
    }

    pub fn with_registry(mut self, registry: FlowRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_execution_repository(
        mut self,
        repository: Arc<dyn ExecutionRepositoryPort>,
    ) -> Self {
        self.executions = Some(repository);
        self
    }

    pub fn registry(&self) -> &FlowRegistry {
        &self.registry
    }

    /// Run a flow once
    pub async fn execute(
        &self,
        config: &AgenticFlowConfiguration,
        prompt: &str,
        provider: &dyn ProviderCallPort,
        target: &FlowTarget,
    ) -> Result<AgenticFlowResult, FlowExecutionError> {
        let flow_type = config.flow_type;
        let started = Instant::now();
        let fail = |source: FlowError, partial_steps: Vec<ProcessingStep>| FlowExecutionError {
            flow_type,
            source,
            partial_steps,
            processing_time_ms: elapsed_ms(started),
            execution_id: None,
        };

        let settings = config.settings().map_err(|e| fail(e.into(), Vec::new()))?;
        let strategy = self
            .registry
            .get(flow_type)
            .ok_or_else(|| fail(FlowError::UnknownStrategy(flow_type), Vec::new()))?;

        let mut ctx = FlowContext::new(provider, target, &self.services, settings.common.max_calls);
        let work = async {
            if settings.common.baseline_check {
                ctx.call("baseline", prompt.to_string()).await?;
            }
            strategy.run(prompt, &settings.strategy, &mut ctx).await
        };
        let outcome = match target.flow_timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .unwrap_or(Err(FlowError::Timeout)),
            None => work.await,
        };

        let output = match outcome {
            Ok(output) => output,
            Err(e) => {
                warn!(flow = %flow_type, calls = ctx.calls(), error = %e, "Flow failed");
                return Err(fail(e, ctx.into_steps()));
            }
        };

        let response_changed = ctx
            .baseline()
            .is_some_and(|baseline| baseline.trim() != output.final_response.trim());
        let provider_calls = ctx.calls();
        let processing_time_ms = elapsed_ms(started);
        info!(
            flow = %flow_type,
            calls = provider_calls,
            elapsed_ms = processing_time_ms,
            changed = response_changed,
            "Flow completed"
        );

        Ok(AgenticFlowResult {
            flow_type,
            original_prompt: prompt.to_string(),
            enhanced_prompt: output.enhanced_prompt,
            full_response: output.full_response,
            final_response: output.final_response,
            reasoning: output.reasoning,
            processing_steps: ctx.into_steps(),
            processing_time_ms,
            response_changed,
            provider_calls,
            metrics: output.metrics,
        })
    }

    /// Run a flow and append the outcome to the execution history.
    ///
    /// Returns the id of the recorded execution alongside the result; the id
    /// is `None` when no history is kept or the write failed. A history
    /// write failure is logged and does not fail the run.
    pub async fn execute_recorded(
        &self,
        scope: ExecutionScope,
        config: &AgenticFlowConfiguration,
        prompt: &str,
        provider: &dyn ProviderCallPort,
        target: &FlowTarget,
    ) -> Result<(AgenticFlowResult, Option<ExecutionId>), FlowExecutionError> {
        match self.execute(config, prompt, provider, target).await {
            Ok(result) => {
                let execution =
                    AgenticFlowExecution::succeeded(scope, prompt, result.clone(), Utc::now());
                let recorded = self.append(&execution).await.then_some(execution.id);
                Ok((result, recorded))
            }
            Err(mut error) => {
                let execution = AgenticFlowExecution::failed(
                    scope,
                    error.flow_type,
                    prompt,
                    error.partial_steps.clone(),
                    error.processing_time_ms,
                    error.source.to_string(),
                    Utc::now(),
                );
                if self.append(&execution).await {
                    error.execution_id = Some(execution.id);
                }
                Err(error)
            }
        }
    }

    async fn append(&self, execution: &AgenticFlowExecution) -> bool {
        let Some(repository) = &self.executions else {
            return false;
        };
        match repository.append(execution).await {
            Ok(()) => true,
            Err(e) => {
                warn!(execution = %execution.id, error = %e, "Failed to record flow execution");
                false
            }
        }
    }

    /// Whether a strategy exists for the flow type
    pub fn supports(&self, flow_type: AgenticFlowType) -> bool {
        self.registry.get(flow_type).is_some()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::testing::{ScriptedCalls, no_services, target};
    use crate::ports::persistence::PersistenceError;
    use crate::ports::provider_call::{GatewayError, ProviderRequest};
    use agora_domain::{DebateId, FlowId};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct History(Mutex<Vec<AgenticFlowExecution>>);

    #[async_trait]
    impl ExecutionRepositoryPort for History {
        async fn append(&self, execution: &AgenticFlowExecution) -> Result<(), PersistenceError> {
            self.0.lock().unwrap().push(execution.clone());
            Ok(())
        }

        async fn by_flow(
            &self,
            flow_id: FlowId,
        ) -> Result<Vec<AgenticFlowExecution>, PersistenceError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.flow_id == Some(flow_id))
                .cloned()
                .collect())
        }

        async fn by_debate(
            &self,
            debate_id: DebateId,
        ) -> Result<Vec<AgenticFlowExecution>, PersistenceError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.debate_id == Some(debate_id))
                .cloned()
                .collect())
        }
    }

    #[tokio::test]
    async fn test_ensemble_majority_result() {
        let executor = AgenticFlowExecutor::new(no_services());
        let provider = ScriptedCalls::new(["A", "A", "B"]);
        let config = AgenticFlowConfiguration::new(AgenticFlowType::EnsembleVoting);

        let result = executor
            .execute(&config, "Q", &provider, &target())
            .await
            .unwrap();
        assert_eq!(result.final_response, "A");
        assert_eq!(result.provider_calls, 3);
        assert!(!result.processing_steps.is_empty());
        assert!(!result.response_changed);
    }

    #[tokio::test]
    async fn test_chaining_result_and_change_detection() {
        let executor = AgenticFlowExecutor::new(no_services());
        let provider = ScriptedCalls::new(["outline", "draft", "final"]);
        let config = AgenticFlowConfiguration::new(AgenticFlowType::PromptChaining).with_param(
            "stages",
            json!(["Outline: {prompt}", "Draft {previous}", "Polish {previous}"]),
        );

        let result = executor
            .execute(&config, "ban cars?", &provider, &target())
            .await
            .unwrap();
        assert_eq!(result.final_response, "final");
        assert_eq!(result.processing_steps.len(), 3);
        assert!(result.response_changed);
        assert_eq!(result.enhanced_prompt, "Polish draft");
    }

    #[tokio::test]
    async fn test_baseline_check_adds_one_call() {
        let executor = AgenticFlowExecutor::new(no_services());
        let provider = ScriptedCalls::new(["plain answer", "principled answer"]);
        let config = AgenticFlowConfiguration::new(AgenticFlowType::ConstitutionalPrompting)
            .with_param("baseline_check", true);

        let result = executor
            .execute(&config, "Q", &provider, &target())
            .await
            .unwrap();
        assert_eq!(result.provider_calls, 2);
        assert_eq!(result.processing_steps[0].step_type, "baseline");
        assert!(result.response_changed);
        assert_eq!(provider.prompts()[0], "Q");
    }

    #[tokio::test]
    async fn test_budget_exceeded_keeps_partial_steps() {
        let executor = AgenticFlowExecutor::new(no_services());
        let provider = ScriptedCalls::new(["draft", "critique one", "critique two"]);
        let config = AgenticFlowConfiguration::new(AgenticFlowType::SelfCritiqueLoop)
            .with_param("iterations", 3)
            .with_param("max_calls", 2);

        let err = executor
            .execute(&config, "Q", &provider, &target())
            .await
            .unwrap_err();
        assert_eq!(err.source, FlowError::CallBudgetExceeded(2));
        assert_eq!(err.partial_steps.len(), 2);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_invalid_configuration_has_no_steps() {
        let executor = AgenticFlowExecutor::new(no_services());
        let provider = ScriptedCalls::new(["unused"]);
        let config = AgenticFlowConfiguration::new(AgenticFlowType::PromptChaining);

        let err = executor
            .execute(&config, "Q", &provider, &target())
            .await
            .unwrap_err();
        assert!(matches!(err.source, FlowError::Configuration(_)));
        assert!(err.partial_steps.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unregistered_strategy() {
        let executor =
            AgenticFlowExecutor::new(no_services()).with_registry(FlowRegistry::default());
        let provider = ScriptedCalls::new(["unused"]);
        let config = AgenticFlowConfiguration::new(AgenticFlowType::StepBackPrompting);

        let err = executor
            .execute(&config, "Q", &provider, &target())
            .await
            .unwrap_err();
        assert_eq!(err.source, FlowError::UnknownStrategy(AgenticFlowType::StepBackPrompting));
        assert!(!executor.supports(AgenticFlowType::StepBackPrompting));
    }

    struct Stalled;

    #[async_trait]
    impl ProviderCallPort for Stalled {
        async fn call(&self, _request: &ProviderRequest) -> Result<String, GatewayError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("late".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_flow_timeout() {
        let executor = AgenticFlowExecutor::new(no_services());
        let config = AgenticFlowConfiguration::new(AgenticFlowType::StepBackPrompting);
        let target = target().with_flow_timeout(Some(Duration::from_secs(1)));

        let err = executor
            .execute(&config, "Q", &Stalled, &target)
            .await
            .unwrap_err();
        assert_eq!(err.source, FlowError::Timeout);
        assert!(err.is_retryable());
        assert!(err.partial_steps.is_empty());
    }

    #[tokio::test]
    async fn test_recorded_history_for_success_and_failure() {
        let history = Arc::new(History::default());
        let executor =
            AgenticFlowExecutor::new(no_services()).with_execution_repository(history.clone());
        let flow_id = FlowId::new();
        let scope = ExecutionScope {
            flow_id: Some(flow_id),
            ..Default::default()
        };
        let config = AgenticFlowConfiguration::new(AgenticFlowType::StepBackPrompting);

        let ok = ScriptedCalls::new(["principles", "answer"]);
        let (result, execution_id) = executor
            .execute_recorded(scope, &config, "Q", &ok, &target())
            .await
            .unwrap();
        assert_eq!(result.final_response, "answer");
        assert!(execution_id.is_some());

        let broken = ScriptedCalls::new(["principles"]);
        let err = executor
            .execute_recorded(scope, &config, "Q", &broken, &target())
            .await
            .unwrap_err();
        assert!(err.execution_id.is_some());

        let recorded = history.by_flow(flow_id).await.unwrap();
        assert_eq!(recorded.len(), 2);
        assert_eq!(Some(recorded[0].id), execution_id);
        assert!(recorded[1].is_error());
        assert_eq!(recorded[1].partial_steps.len(), 1);
    }
}
