//! Per-execution state handed to a strategy
//!
//! A [`FlowContext`] owns the call budget and the step log of exactly one
//! execution. Strategies reach the provider only through it, so every
//! provider call is counted and recorded.

use crate::flows::error::FlowError;
use crate::ports::provider_call::{ProviderCallPort, ProviderRequest};
use crate::ports::rag_retrieval::RagRetrievalPort;
use crate::ports::tool_execution::ToolExecutionPort;
use agora_domain::{Model, ProcessingStep};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Which provider and model a flow talks to
#[derive(Debug, Clone, PartialEq)]
pub struct FlowTarget {
    pub provider: String,
    pub model: Model,
    pub organization: Option<String>,
    pub system_prompt: Option<String>,
    /// Per-call timeout (bounded by the round budget)
    pub call_timeout: Option<Duration>,
    /// Budget for the whole execution
    pub flow_timeout: Option<Duration>,
}

impl FlowTarget {
    pub fn new(provider: impl Into<String>, model: Model) -> Self {
        Self {
            provider: provider.into(),
            model,
            organization: None,
            system_prompt: None,
            call_timeout: None,
            flow_timeout: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_flow_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.flow_timeout = timeout;
        self
    }
}

/// Collaborators a strategy may use besides the provider
#[derive(Clone)]
pub struct FlowServices {
    pub tools: Arc<dyn ToolExecutionPort>,
    pub retrieval: Arc<dyn RagRetrievalPort>,
}

/// Mutable state of one flow execution
pub struct FlowContext<'a> {
    provider: &'a dyn ProviderCallPort,
    target: &'a FlowTarget,
    services: &'a FlowServices,
    max_calls: u32,
    calls: u32,
    steps: Vec<ProcessingStep>,
    baseline: Option<String>,
}

impl<'a> FlowContext<'a> {
    pub fn new(
        provider: &'a dyn ProviderCallPort,
        target: &'a FlowTarget,
        services: &'a FlowServices,
        max_calls: u32,
    ) -> Self {
        Self {
            provider,
            target,
            services,
            max_calls,
            calls: 0,
            steps: Vec::new(),
            baseline: None,
        }
    }

    /// Call the provider and record the step
    pub async fn call(&mut self, step_type: &str, prompt: String) -> Result<String, FlowError> {
        self.call_inner(step_type, prompt, None).await
    }

    /// Call the provider with an explicit sampling temperature
    pub async fn call_with_temperature(
        &mut self,
        step_type: &str,
        prompt: String,
        temperature: f64,
    ) -> Result<String, FlowError> {
        self.call_inner(step_type, prompt, Some(temperature)).await
    }

    async fn call_inner(
        &mut self,
        step_type: &str,
        prompt: String,
        temperature: Option<f64>,
    ) -> Result<String, FlowError> {
        if self.calls >= self.max_calls {
            return Err(FlowError::CallBudgetExceeded(self.max_calls));
        }
        self.calls += 1;

        let mut request = ProviderRequest::new(
            self.target.provider.clone(),
            self.target.model.clone(),
            prompt,
        )
        .with_organization(self.target.organization.clone())
        .with_timeout(self.target.call_timeout);
        if let Some(system_prompt) = &self.target.system_prompt {
            request = request.with_system_prompt(system_prompt.clone());
        }
        if let Some(temperature) = temperature {
            request = request.with_temperature(temperature);
        }

        debug!(
            step = step_type,
            call = self.calls,
            provider = %self.target.provider,
            "Flow provider call"
        );
        let output = self.provider.call(&request).await?;
        if output.trim().is_empty() {
            return Err(FlowError::EmptyResponse(step_type.to_string()));
        }

        if self.baseline.is_none() {
            self.baseline = Some(output.clone());
        }
        self.steps
            .push(ProcessingStep::new(step_type, request.prompt, output.clone()));
        Ok(output)
    }

    /// Record a local (non-provider) step such as voting or rewriting
    pub fn record(&mut self, step_type: &str, input: impl Into<String>, output: impl Into<String>) {
        self.steps.push(ProcessingStep::new(step_type, input, output));
    }

    pub fn tools(&self) -> &dyn ToolExecutionPort {
        self.services.tools.as_ref()
    }

    pub fn retrieval(&self) -> &dyn RagRetrievalPort {
        self.services.retrieval.as_ref()
    }

    pub fn organization(&self) -> Option<&str> {
        self.target.organization.as_deref()
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }

    /// First raw model output of this execution
    pub fn baseline(&self) -> Option<&str> {
        self.baseline.as_deref()
    }

    /// Recorded steps. Empty when no provider call happened, so local steps
    /// never appear without a model call behind them.
    pub fn into_steps(self) -> Vec<ProcessingStep> {
        if self.calls == 0 { Vec::new() } else { self.steps }
    }
}
