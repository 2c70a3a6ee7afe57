//! Agentic flow operations: ad-hoc execution, stored flows, history.

use super::{DebateService, DebateServiceError};
use crate::flows::context::FlowTarget;
use crate::ports::persistence::FlowRepositoryPort;
use agora_domain::{
    AgenticFlow, AgenticFlowConfiguration, AgenticFlowExecution, AgenticFlowResult, DebateId,
    DomainError, ExecutionScope, FlowId, FlowStatistics, FlowStatus, ParticipantId,
    PromptTemplate,
};
use chrono::Utc;
use tracing::info;

impl DebateService {
    /// Run a flow outside of a turn. With a debate and participant the call
    /// uses that participant's binding and is recorded against both;
    /// otherwise the default model is used.
    ///
    /// The result is not submitted to the debate.
    pub async fn execute_agentic_flow(
        &self,
        config: &AgenticFlowConfiguration,
        prompt: &str,
        debate_id: Option<DebateId>,
        participant_id: Option<ParticipantId>,
    ) -> Result<AgenticFlowResult, DebateServiceError> {
        config.validate()?;
        let target = self.flow_target(debate_id, participant_id).await?;
        let scope = ExecutionScope {
            flow_id: None,
            debate_id,
            participant_id,
        };
        let (result, _) = self
            .executor
            .execute_recorded(scope, config, prompt, self.provider.as_ref(), &target)
            .await?;
        Ok(result)
    }

    async fn flow_target(
        &self,
        debate_id: Option<DebateId>,
        participant_id: Option<ParticipantId>,
    ) -> Result<FlowTarget, DebateServiceError> {
        let timeout = self.params.flow_timeout;
        if let (Some(debate_id), Some(participant_id)) = (debate_id, participant_id) {
            let handle = self.handle(debate_id).await?;
            let debate = handle.lock().await;
            let participant = debate
                .participant(participant_id)
                .ok_or_else(|| DomainError::ParticipantNotInDebate(participant_id.to_string()))?;
            let model = participant
                .model
                .clone()
                .ok_or_else(|| DebateServiceError::NoProviderBinding(participant.name.clone()))?;
            let provider = participant
                .provider
                .clone()
                .or_else(|| self.providers.resolve(&model))
                .ok_or_else(|| DebateServiceError::NoProviderBinding(participant.name.clone()))?;
            return Ok(FlowTarget::new(provider, model)
                .with_system_prompt(PromptTemplate::turn_system(participant.position.as_str()))
                .with_organization(self.params.organization.clone())
                .with_call_timeout(timeout)
                .with_flow_timeout(timeout));
        }

        let model = self.params.default_model.clone();
        let provider = self
            .providers
            .resolve(&model)
            .ok_or_else(|| DebateServiceError::NoProviderBinding(model.to_string()))?;
        Ok(FlowTarget::new(provider, model)
            .with_organization(self.params.organization.clone())
            .with_call_timeout(timeout)
            .with_flow_timeout(timeout))
    }

    // ==================== Stored flows ====================

    fn flow_repository(&self) -> Result<&dyn FlowRepositoryPort, DebateServiceError> {
        self.flows
            .as_deref()
            .ok_or_else(|| DomainError::config("no flow repository is configured").into())
    }

    /// Validate and store a named flow
    pub async fn create_flow(
        &self,
        name: &str,
        organization_id: Option<String>,
        config: AgenticFlowConfiguration,
    ) -> Result<AgenticFlow, DebateServiceError> {
        let repository = self.flow_repository()?;
        let flow = AgenticFlow::new(name, organization_id, config, Utc::now())?;
        repository.save_flow(&flow).await?;
        info!(flow_id = %flow.id, flow = %flow.configuration.flow_type, name, "Flow created");
        Ok(flow)
    }

    /// Enable or disable a stored flow
    pub async fn set_flow_status(
        &self,
        flow_id: FlowId,
        status: FlowStatus,
    ) -> Result<AgenticFlow, DebateServiceError> {
        let repository = self.flow_repository()?;
        let mut flow = repository
            .find_flow(flow_id)
            .await?
            .ok_or(DebateServiceError::FlowNotFound(flow_id))?;
        flow.status = status;
        repository.save_flow(&flow).await?;
        info!(flow_id = %flow_id, ?status, "Flow status changed");
        Ok(flow)
    }

    pub async fn list_flows(
        &self,
        organization_id: Option<&str>,
    ) -> Result<Vec<AgenticFlow>, DebateServiceError> {
        Ok(self.flow_repository()?.list_flows(organization_id).await?)
    }

    pub(super) async fn find_active_flow(
        &self,
        flow_id: FlowId,
    ) -> Result<AgenticFlow, DebateServiceError> {
        let flow = self
            .flow_repository()?
            .find_flow(flow_id)
            .await?
            .ok_or(DebateServiceError::FlowNotFound(flow_id))?;
        if !flow.is_active() {
            return Err(DebateServiceError::FlowDisabled(flow_id));
        }
        Ok(flow)
    }

    /// Run a stored flow outside of a turn
    pub async fn execute_stored_flow(
        &self,
        flow_id: FlowId,
        prompt: &str,
    ) -> Result<AgenticFlowResult, DebateServiceError> {
        let flow = self.find_active_flow(flow_id).await?;
        let target = self.flow_target(None, None).await?;
        let scope = ExecutionScope {
            flow_id: Some(flow_id),
            ..Default::default()
        };
        let (result, _) = self
            .executor
            .execute_recorded(scope, &flow.configuration, prompt, self.provider.as_ref(), &target)
            .await?;
        Ok(result)
    }

    // ==================== History ====================

    /// Executions of a stored flow, oldest first
    pub async fn flow_history(
        &self,
        flow_id: FlowId,
    ) -> Result<Vec<AgenticFlowExecution>, DebateServiceError> {
        match &self.executions {
            Some(executions) => Ok(executions.by_flow(flow_id).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Executions run for a debate's turns, oldest first
    pub async fn debate_executions(
        &self,
        debate_id: DebateId,
    ) -> Result<Vec<AgenticFlowExecution>, DebateServiceError> {
        match &self.executions {
            Some(executions) => Ok(executions.by_debate(debate_id).await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn flow_statistics(
        &self,
        flow_id: FlowId,
    ) -> Result<FlowStatistics, DebateServiceError> {
        let history = self.flow_history(flow_id).await?;
        Ok(FlowStatistics::from_executions(&history))
    }
}
