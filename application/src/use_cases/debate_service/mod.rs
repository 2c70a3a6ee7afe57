//! Debate service
//!
//! The operation surface transports call into. Each debate lives behind its
//! own `tokio::sync::Mutex`, so all mutation of one debate is single-writer
//! while different debates proceed in parallel. Notifications for a debate
//! are published while its lock is held, which keeps them in order.
//!
//! Provider calls (agentic flows, plain model turns) never run while a
//! debate lock is held: a generated turn snapshots what it needs, releases
//! the lock, calls out, and re-locks to submit against the round it started
//! in.
//!
//! | Operation              | Module   |
//! |------------------------|----------|
//! | create / join / start  | this     |
//! | submit / generate turn | `turns`  |
//! | flows and history      | `flows`  |

mod flows;
mod turns;
mod types;

pub use types::{DebateServiceError, FlowRequest, FlowSelection, TurnInput};

use crate::config::ServiceParams;
use crate::flows::context::FlowServices;
use crate::flows::executor::AgenticFlowExecutor;
use crate::flows::registry::FlowRegistry;
use crate::ports::event_publisher::{DebateNotification, EventPublisherPort, NoEventPublisher};
use crate::ports::persistence::{
    DebatePersistencePort, ExecutionRepositoryPort, FlowRepositoryPort,
};
use crate::ports::provider_call::ProviderCallPort;
use crate::ports::rag_retrieval::NoRetrieval;
use crate::ports::tool_execution::NoTools;
use crate::use_cases::round_coordinator::RoundTimer;
use agora_domain::{
    Debate, DebateConfig, DebateId, DomainError, NewParticipant, ParticipantId, ParticipantType,
    ProviderConfig, RoundAdvance, RoundClosure, RunToMaxRounds, TerminationPolicy,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type DebateHandle = Arc<Mutex<Debate>>;

/// Debate lifecycle, turns and agentic flows behind one facade
pub struct DebateService {
    debates: RwLock<HashMap<DebateId, DebateHandle>>,
    pub(super) provider: Arc<dyn ProviderCallPort>,
    pub(super) executor: AgenticFlowExecutor,
    persistence: Option<Arc<dyn DebatePersistencePort>>,
    pub(super) flows: Option<Arc<dyn FlowRepositoryPort>>,
    pub(super) executions: Option<Arc<dyn ExecutionRepositoryPort>>,
    events: Arc<dyn EventPublisherPort>,
    policy: Arc<dyn TerminationPolicy>,
    pub(super) providers: ProviderConfig,
    pub(super) params: ServiceParams,
    timers: CancellationToken,
    this: Weak<DebateService>,
}

/// Wires a [`DebateService`]; only the provider is required
pub struct DebateServiceBuilder {
    provider: Arc<dyn ProviderCallPort>,
    services: FlowServices,
    registry: Option<FlowRegistry>,
    persistence: Option<Arc<dyn DebatePersistencePort>>,
    flows: Option<Arc<dyn FlowRepositoryPort>>,
    executions: Option<Arc<dyn ExecutionRepositoryPort>>,
    events: Arc<dyn EventPublisherPort>,
    policy: Arc<dyn TerminationPolicy>,
    providers: ProviderConfig,
    params: ServiceParams,
}

impl DebateServiceBuilder {
    pub fn with_flow_services(mut self, services: FlowServices) -> Self {
        self.services = services;
        self
    }

    pub fn with_flow_registry(mut self, registry: FlowRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn DebatePersistencePort>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn with_flow_repository(mut self, flows: Arc<dyn FlowRepositoryPort>) -> Self {
        self.flows = Some(flows);
        self
    }

    pub fn with_execution_repository(
        mut self,
        executions: Arc<dyn ExecutionRepositoryPort>,
    ) -> Self {
        self.executions = Some(executions);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventPublisherPort>) -> Self {
        self.events = events;
        self
    }

    pub fn with_termination_policy(mut self, policy: Arc<dyn TerminationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_provider_config(mut self, providers: ProviderConfig) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_params(mut self, params: ServiceParams) -> Self {
        self.params = params;
        self
    }

    pub fn build(self) -> Arc<DebateService> {
        let mut executor = AgenticFlowExecutor::new(self.services);
        if let Some(registry) = self.registry {
            executor = executor.with_registry(registry);
        }
        if let Some(executions) = &self.executions {
            executor = executor.with_execution_repository(Arc::clone(executions));
        }

        Arc::new_cyclic(|this| DebateService {
            debates: RwLock::new(HashMap::new()),
            provider: self.provider,
            executor,
            persistence: self.persistence,
            flows: self.flows,
            executions: self.executions,
            events: self.events,
            policy: self.policy,
            providers: self.providers,
            params: self.params,
            timers: CancellationToken::new(),
            this: this.clone(),
        })
    }
}

impl DebateService {
    pub fn builder(provider: Arc<dyn ProviderCallPort>) -> DebateServiceBuilder {
        DebateServiceBuilder {
            provider,
            services: FlowServices {
                tools: Arc::new(NoTools),
                retrieval: Arc::new(NoRetrieval),
            },
            registry: None,
            persistence: None,
            flows: None,
            executions: None,
            events: Arc::new(NoEventPublisher),
            policy: Arc::new(RunToMaxRounds),
            providers: ProviderConfig::default(),
            params: ServiceParams::default(),
        }
    }

    pub fn params(&self) -> &ServiceParams {
        &self.params
    }

    // ==================== Registry ====================

    fn read_registry(&self) -> RwLockReadGuard<'_, HashMap<DebateId, DebateHandle>> {
        self.debates.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_registry(&self) -> RwLockWriteGuard<'_, HashMap<DebateId, DebateHandle>> {
        self.debates.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Handle of a debate, loading it from persistence on first access
    pub(super) async fn handle(&self, id: DebateId) -> Result<DebateHandle, DebateServiceError> {
        let cached = self.read_registry().get(&id).cloned();
        if let Some(handle) = cached {
            return Ok(handle);
        }

        let Some(persistence) = &self.persistence else {
            return Err(DebateServiceError::NotFound(id));
        };
        let debate = persistence
            .find(id)
            .await?
            .ok_or(DebateServiceError::NotFound(id))?;
        debug!(debate_id = %id, "Debate loaded from persistence");
        let mut registry = self.write_registry();
        Ok(Arc::clone(
            registry
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(debate))),
        ))
    }

    /// Save a snapshot. The in-memory state is kept even when this fails.
    pub(super) async fn persist(&self, debate: &Debate) -> Result<(), DebateServiceError> {
        let Some(persistence) = &self.persistence else {
            return Ok(());
        };
        persistence.save(debate).await.map_err(|e| {
            warn!(debate_id = %debate.id(), error = %e, "Failed to persist debate");
            e.into()
        })
    }

    pub(super) fn publish(&self, event: DebateNotification) {
        self.events.publish(&event);
    }

    pub(super) fn policy(&self) -> &dyn TerminationPolicy {
        self.policy.as_ref()
    }

    // ==================== Lifecycle ====================

    /// Create a debate in `CREATED`. Nothing is registered when the first
    /// save fails.
    pub async fn create_debate(
        &self,
        topic: &str,
        config: DebateConfig,
    ) -> Result<DebateId, DebateServiceError> {
        let debate = Debate::new(topic, config, Utc::now())?;
        let id = debate.id();
        self.persist(&debate).await?;
        info!(debate_id = %id, topic = debate.topic(), "Debate created");
        self.write_registry().insert(id, Arc::new(Mutex::new(debate)));
        Ok(id)
    }

    /// Register a participant. AI participants need a model; their provider
    /// defaults to the configured route for that model.
    pub async fn join_debate(
        &self,
        debate_id: DebateId,
        mut participant: NewParticipant,
    ) -> Result<ParticipantId, DebateServiceError> {
        if let Some(flow) = &participant.flow {
            flow.validate()?;
        }
        if participant.participant_type == ParticipantType::Ai {
            let model = participant.model.clone().ok_or_else(|| {
                DomainError::config(format!("AI participant {} needs a model", participant.name))
            })?;
            if participant.provider.is_none() {
                participant.provider = self.providers.resolve(&model);
            }
            if participant.provider.is_none() {
                return Err(DebateServiceError::NoProviderBinding(model.to_string()));
            }
        }

        let handle = self.handle(debate_id).await?;
        let mut debate = handle.lock().await;
        let name = participant.name.clone();
        let id = debate.join(participant, Utc::now())?;
        info!(
            debate_id = %debate_id,
            participant = %name,
            participant_id = %id,
            "Participant joined"
        );
        self.persist(&debate).await?;
        Ok(id)
    }

    /// Activate or deactivate a participant. Deactivating during a round
    /// forfeits the open turn, which closes the round when nobody else is
    /// outstanding.
    pub async fn set_participant_active(
        &self,
        debate_id: DebateId,
        participant_id: ParticipantId,
        active: bool,
    ) -> Result<Option<RoundClosure>, DebateServiceError> {
        let handle = self.handle(debate_id).await?;
        let mut debate = handle.lock().await;
        let closure = debate.set_active(participant_id, active, Utc::now(), self.policy())?;
        info!(
            debate_id = %debate_id,
            participant_id = %participant_id,
            active,
            "Participant activity changed"
        );
        if let Some(closure) = &closure {
            self.round_closed(&debate, closure);
        }
        self.persist(&debate).await?;
        Ok(closure)
    }

    /// CREATED → INITIALIZED (checks the participant quorum)
    pub async fn initialize_debate(&self, debate_id: DebateId) -> Result<(), DebateServiceError> {
        let handle = self.handle(debate_id).await?;
        let mut debate = handle.lock().await;
        debate.initialize()?;
        info!(
            debate_id = %debate_id,
            participants = debate.participants().len(),
            "Debate initialized"
        );
        self.persist(&debate).await
    }

    /// INITIALIZED → IN_PROGRESS; opens round 1 and arms its timer
    pub async fn start_debate(&self, debate_id: DebateId) -> Result<u32, DebateServiceError> {
        let handle = self.handle(debate_id).await?;
        let mut debate = handle.lock().await;
        let round = debate.start(Utc::now())?;

        info!(debate_id = %debate_id, round, "Debate started");
        self.publish(DebateNotification::DebateStarted {
            debate_id,
            topic: debate.topic().to_string(),
            participants: debate.participants().iter().filter(|p| p.active).count(),
            max_rounds: debate.config().max_rounds,
        });
        self.round_opened(&debate);
        self.persist(&debate).await?;
        Ok(round)
    }

    /// DEBATE_COMPLETE → ARCHIVED
    pub async fn archive_debate(&self, debate_id: DebateId) -> Result<(), DebateServiceError> {
        let handle = self.handle(debate_id).await?;
        let mut debate = handle.lock().await;
        debate.archive(Utc::now())?;
        info!(debate_id = %debate_id, "Debate archived");
        self.publish(DebateNotification::DebateArchived { debate_id });
        self.persist(&debate).await
    }

    /// Move a running debate to ERROR. Recorded responses are kept.
    pub async fn fail_debate(
        &self,
        debate_id: DebateId,
        reason: &str,
    ) -> Result<(), DebateServiceError> {
        let handle = self.handle(debate_id).await?;
        let mut debate = handle.lock().await;
        debate.fail(reason, Utc::now())?;
        warn!(debate_id = %debate_id, reason, "Debate failed");
        self.publish(DebateNotification::DebateFailed {
            debate_id,
            reason: reason.to_string(),
        });
        self.persist(&debate).await
    }

    /// Force completion of round `round` if it is still open.
    ///
    /// Returns `None` when the round had already closed.
    pub async fn expire_round(
        &self,
        debate_id: DebateId,
        round: u32,
    ) -> Result<Option<RoundClosure>, DebateServiceError> {
        let handle = self.handle(debate_id).await?;
        let mut debate = handle.lock().await;
        let closure = debate.force_complete_round(round, Utc::now(), self.policy())?;
        if let Some(closure) = &closure {
            info!(debate_id = %debate_id, round, "Round expired");
            self.round_closed(&debate, closure);
            self.persist(&debate).await?;
        }
        Ok(closure)
    }

    // ==================== Queries ====================

    pub async fn get_debate(&self, debate_id: DebateId) -> Result<Debate, DebateServiceError> {
        let handle = self.handle(debate_id).await?;
        let debate = handle.lock().await;
        Ok(debate.clone())
    }

    /// Snapshots of every known debate, oldest first
    pub async fn list_debates(&self) -> Result<Vec<Debate>, DebateServiceError> {
        let mut ids: Vec<DebateId> = self.read_registry().keys().copied().collect();
        if let Some(persistence) = &self.persistence {
            for id in persistence.list_ids().await? {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        let mut debates = Vec::with_capacity(ids.len());
        for id in ids {
            debates.push(self.get_debate(id).await?);
        }
        debates.sort_by_key(|d| d.created_at());
        Ok(debates)
    }

    /// Stop every pending round timer
    pub fn shutdown(&self) {
        self.timers.cancel();
    }

    // ==================== Round events ====================

    /// Publish RoundStarted for the open round and arm its timer
    fn round_opened(&self, debate: &Debate) {
        let Some(round) = debate.open_round() else {
            return;
        };
        self.publish(DebateNotification::RoundStarted {
            debate_id: debate.id(),
            round: round.number,
            turn_order: round.turn_order().collect(),
        });

        if let Some(limit) = debate.config().round_time_limit() {
            RoundTimer::arm(
                self.this.clone(),
                debate.id(),
                round.number,
                limit + self.params.round_grace,
                self.timers.child_token(),
            );
        }
    }

    /// Publish the closure and whatever followed it
    pub(super) fn round_closed(&self, debate: &Debate, closure: &RoundClosure) {
        let debate_id = debate.id();
        info!(
            debate_id = %debate_id,
            round = closure.round_number,
            responses = closure.response_count,
            missed = closure.missed.len(),
            failed = closure.failed.len(),
            timed_out = closure.timed_out,
            "Round completed"
        );
        self.publish(DebateNotification::RoundCompleted {
            debate_id,
            round: closure.round_number,
            responses: closure.response_count,
            missed: closure.missed.clone(),
            failed: closure.failed.clone(),
            timed_out: closure.timed_out,
        });

        match &closure.advance {
            RoundAdvance::NextRound { number } => {
                debug!(debate_id = %debate_id, round = number, "Next round opened");
                self.round_opened(debate);
            }
            RoundAdvance::DebateCompleted { reason } => {
                info!(debate_id = %debate_id, reason = %reason, "Debate completed");
                self.publish(DebateNotification::DebateCompleted {
                    debate_id,
                    rounds: debate.current_round(),
                    responses: debate.response_count(),
                    reason: reason.clone(),
                });
            }
        }
    }
}

impl Drop for DebateService {
    fn drop(&mut self) {
        self.timers.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::persistence::PersistenceError;
    use crate::ports::provider_call::{GatewayError, ProviderRequest};
    use agora_domain::{DebateStatus, Model};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Silent;

    #[async_trait]
    impl ProviderCallPort for Silent {
        async fn call(&self, _request: &ProviderRequest) -> Result<String, GatewayError> {
            Err(GatewayError::ConnectionError("offline".to_string()))
        }
    }

    /// Accepts the first `healthy` saves, then reports a full disk
    struct BrokenStore {
        healthy: usize,
        saves: AtomicUsize,
    }

    impl BrokenStore {
        fn after(healthy: usize) -> Arc<Self> {
            Arc::new(Self {
                healthy,
                saves: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DebatePersistencePort for BrokenStore {
        async fn save(&self, _debate: &Debate) -> Result<(), PersistenceError> {
            if self.saves.fetch_add(1, Ordering::SeqCst) < self.healthy {
                return Ok(());
            }
            Err(PersistenceError::Storage("disk full".to_string()))
        }

        async fn find(&self, _id: DebateId) -> Result<Option<Debate>, PersistenceError> {
            Ok(None)
        }

        async fn list_ids(&self) -> Result<Vec<DebateId>, PersistenceError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_unknown_debate() {
        let service = DebateService::builder(Arc::new(Silent)).build();
        let id = DebateId::new();
        assert_eq!(
            service.get_debate(id).await.unwrap_err(),
            DebateServiceError::NotFound(id)
        );
    }

    #[tokio::test]
    async fn test_ai_participant_gets_family_provider() {
        let service = DebateService::builder(Arc::new(Silent)).build();
        let id = service
            .create_debate("Ban cars?", DebateConfig::default())
            .await
            .unwrap();

        let mut request = NewParticipant::ai("A", "pro", "x", Model::Gpt52);
        request.provider = None;
        let pid = service.join_debate(id, request).await.unwrap();

        let debate = service.get_debate(id).await.unwrap();
        assert_eq!(
            debate.participant(pid).unwrap().provider.as_deref(),
            Some("openai")
        );
    }

    #[tokio::test]
    async fn test_unroutable_model_is_rejected() {
        let service = DebateService::builder(Arc::new(Silent)).build();
        let id = service
            .create_debate("Ban cars?", DebateConfig::default())
            .await
            .unwrap();

        let mut request = NewParticipant::ai("A", "pro", "x", Model::Custom("llama".into()));
        request.provider = None;
        let err = service.join_debate(id, request).await.unwrap_err();
        assert!(matches!(err, DebateServiceError::NoProviderBinding(_)));
    }

    #[tokio::test]
    async fn test_create_is_not_registered_when_save_fails() {
        let service = DebateService::builder(Arc::new(Silent))
            .with_persistence(BrokenStore::after(0))
            .build();

        let err = service
            .create_debate("Ban cars?", DebateConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(service.list_debates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_mutation() {
        let service = DebateService::builder(Arc::new(Silent))
            .with_persistence(BrokenStore::after(1))
            .build();
        let id = service
            .create_debate("Ban cars?", DebateConfig::default())
            .await
            .unwrap();

        let err = service
            .join_debate(id, NewParticipant::human("A", "pro"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        let debate = service.get_debate(id).await.unwrap();
        assert_eq!(debate.status(), DebateStatus::Created);
        assert_eq!(debate.participants().len(), 1);
    }
}
