//! Turn submission: written content and generated turns.

use super::{DebateService, DebateServiceError, FlowRequest, FlowSelection, TurnInput};
use crate::flows::context::FlowTarget;
use crate::ports::event_publisher::DebateNotification;
use crate::ports::provider_call::{GatewayError, ProviderRequest};
use agora_domain::{
    AgenticFlowConfiguration, Debate, DebateId, DomainError, ExecutionScope, FlowId,
    ParticipantId, PromptTemplate, ResponseDraft, SubmitOutcome, TranscriptEntry, TurnTicket,
};
use chrono::Utc;
use tracing::{debug, info, warn};

/// Everything a generated turn needs once the debate lock is released
struct PreparedTurn {
    ticket: TurnTicket,
    prompt: String,
    target: FlowTarget,
    participant_flow: Option<AgenticFlowConfiguration>,
}

impl DebateService {
    /// Submit a turn for `participant_id`.
    ///
    /// Written content is recorded directly. A flow request generates the
    /// content through the participant's model first; if generation fails
    /// the turn is marked failed (not missed) and the error is returned.
    pub async fn submit_response(
        &self,
        debate_id: DebateId,
        participant_id: ParticipantId,
        input: TurnInput,
    ) -> Result<SubmitOutcome, DebateServiceError> {
        match input {
            TurnInput::Content(content) => {
                self.submit_draft(debate_id, participant_id, ResponseDraft::text(content), None)
                    .await
            }
            TurnInput::Flow(request) => {
                self.generate_turn(debate_id, participant_id, request)
                    .await
            }
        }
    }

    /// Record a draft: written content against the current round, a
    /// generated turn against the round its ticket pins
    async fn submit_draft(
        &self,
        debate_id: DebateId,
        participant_id: ParticipantId,
        draft: ResponseDraft,
        ticket: Option<&TurnTicket>,
    ) -> Result<SubmitOutcome, DebateServiceError> {
        let handle = self.handle(debate_id).await?;
        let mut debate = handle.lock().await;
        let now = Utc::now();
        let round = ticket.map_or_else(|| debate.current_round(), |t| t.round);

        // A submission after the grace window closes the overdue round and
        // is itself rejected
        let policy = self.policy();
        if let Some(closure) = debate.expire_overdue(now, self.params.round_grace, policy)? {
            warn!(
                debate_id = %debate_id,
                round,
                participant_id = %participant_id,
                "Late submission"
            );
            self.round_closed(&debate, &closure);
            self.persist(&debate).await?;
            return Err(DomainError::RoundClosed(round).into());
        }

        let outcome = match ticket {
            Some(ticket) => {
                debate.submit_generated(participant_id, draft, ticket, now, self.policy())?
            }
            None => debate.submit_response(participant_id, draft, Some(round), now, self.policy())?,
        };
        let response = &outcome.response;
        info!(
            debate_id = %debate_id,
            round,
            participant_id = %participant_id,
            response_time_ms = response.response_time_ms,
            "Response submitted"
        );
        self.publish(DebateNotification::ResponseSubmitted {
            debate_id,
            round,
            participant_id,
            response_id: response.id,
            response_time_ms: response.response_time_ms,
            flagged: response.flagged,
        });
        if let Some(closure) = &outcome.closure {
            self.round_closed(&debate, closure);
        }
        self.persist(&debate).await?;
        Ok(outcome)
    }

    async fn generate_turn(
        &self,
        debate_id: DebateId,
        participant_id: ParticipantId,
        request: FlowRequest,
    ) -> Result<SubmitOutcome, DebateServiceError> {
        let turn = self
            .prepare_turn(debate_id, participant_id, request.prompt)
            .await?;

        let generated = match self.select_flow(request.flow, turn.participant_flow.clone()).await {
            Ok(Some((config, flow_id))) => {
                let scope = ExecutionScope {
                    flow_id,
                    debate_id: Some(debate_id),
                    participant_id: Some(participant_id),
                };
                self.executor
                    .execute_recorded(
                        scope,
                        &config,
                        &turn.prompt,
                        self.provider.as_ref(),
                        &turn.target,
                    )
                    .await
                    .map(|(result, execution_id)| {
                        let draft = ResponseDraft::text(result.final_response.clone())
                            .flagged(result.is_flagged());
                        match execution_id {
                            Some(id) => draft.with_execution(id),
                            None => draft,
                        }
                    })
                    .map_err(DebateServiceError::from)
            }
            Ok(None) => self.direct_call(&turn).await.map(ResponseDraft::text),
            Err(e) => return Err(e),
        };

        match generated {
            Ok(draft) => {
                self.submit_draft(debate_id, participant_id, draft, Some(&turn.ticket))
                    .await
            }
            Err(e) => {
                self.record_failure(debate_id, participant_id, turn.ticket.round, &e)
                    .await;
                Err(e)
            }
        }
    }

    /// Check the turn is admissible and snapshot what generating it needs
    async fn prepare_turn(
        &self,
        debate_id: DebateId,
        participant_id: ParticipantId,
        prompt_override: Option<String>,
    ) -> Result<PreparedTurn, DebateServiceError> {
        let handle = self.handle(debate_id).await?;
        let mut debate = handle.lock().await;
        let now = Utc::now();
        let round_number = debate.current_round();

        let policy = self.policy();
        if let Some(closure) = debate.expire_overdue(now, self.params.round_grace, policy)? {
            self.round_closed(&debate, &closure);
            self.persist(&debate).await?;
            return Err(DomainError::RoundClosed(round_number).into());
        }

        let round = debate.ensure_can_submit(participant_id, Some(round_number), now)?;
        let remaining = round
            .deadline(debate.config().round_time_limit())
            .map(|deadline| (deadline - now).to_std().unwrap_or_default());

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

        let prompt = prompt_override.unwrap_or_else(|| {
            PromptTemplate::turn_prompt(
                debate.topic(),
                participant.position.as_str(),
                round_number,
                debate.config().max_rounds,
                &transcript(&debate),
            )
        });
        // Calls never outlive the round's grace window
        let budget = remaining
            .map(|left| left + self.params.round_grace)
            .or(self.params.flow_timeout);
        let target = FlowTarget::new(provider, model)
            .with_system_prompt(PromptTemplate::turn_system(participant.position.as_str()))
            .with_organization(self.params.organization.clone())
            .with_call_timeout(budget)
            .with_flow_timeout(budget);

        debug!(
            debate_id = %debate_id,
            round = round_number,
            participant = %participant.name,
            provider = %target.provider,
            "Turn prepared"
        );
        Ok(PreparedTurn {
            ticket: TurnTicket::new(round_number, now, self.params.round_grace),
            prompt,
            target,
            participant_flow: participant.flow.clone(),
        })
    }

    /// Resolve which flow, if any, generates the turn
    async fn select_flow(
        &self,
        selection: FlowSelection,
        participant_flow: Option<AgenticFlowConfiguration>,
    ) -> Result<Option<(AgenticFlowConfiguration, Option<FlowId>)>, DebateServiceError> {
        match selection {
            FlowSelection::Participant => Ok(participant_flow.map(|config| (config, None))),
            FlowSelection::Inline(config) => {
                config.validate()?;
                Ok(Some((config, None)))
            }
            FlowSelection::Stored(flow_id) => {
                let flow = self.find_active_flow(flow_id).await?;
                Ok(Some((flow.configuration, Some(flow_id))))
            }
        }
    }

    /// A single model call without augmentation
    async fn direct_call(&self, turn: &PreparedTurn) -> Result<String, DebateServiceError> {
        let target = &turn.target;
        let mut request =
            ProviderRequest::new(target.provider.clone(), target.model.clone(), turn.prompt.clone())
                .with_organization(target.organization.clone())
                .with_timeout(target.call_timeout);
        if let Some(system_prompt) = &target.system_prompt {
            request = request.with_system_prompt(system_prompt.clone());
        }

        let call = self.provider.call(&request);
        let text = match target.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(GatewayError::Timeout(limit)))?,
            None => call.await?,
        };
        if text.trim().is_empty() {
            return Err(GatewayError::RequestFailed("empty response".to_string()).into());
        }
        Ok(text.trim().to_string())
    }

    /// Mark the turn failed, deadline or not. A turn whose round already
    /// closed stays missed.
    async fn record_failure(
        &self,
        debate_id: DebateId,
        participant_id: ParticipantId,
        round: u32,
        error: &DebateServiceError,
    ) {
        let Ok(handle) = self.handle(debate_id).await else {
            return;
        };
        let mut debate = handle.lock().await;
        let retryable = error.is_retryable();
        let reason = error.to_string();

        match debate.record_turn_failure(participant_id, &reason, retryable, Some(round)) {
            Ok(()) => {
                warn!(
                    debate_id = %debate_id,
                    round,
                    participant_id = %participant_id,
                    retryable,
                    error = %reason,
                    "Turn failed"
                );
                self.publish(DebateNotification::TurnFailed {
                    debate_id,
                    round,
                    participant_id,
                    reason,
                    retryable,
                });
                // The caller gets the turn error; persist only logs
                if let Err(e) = self.persist(&debate).await {
                    warn!(
                        debate_id = %debate_id,
                        round,
                        error = %e,
                        "Turn failure kept in memory only"
                    );
                }
            }
            Err(e) => debug!(
                debate_id = %debate_id,
                participant_id = %participant_id,
                error = %e,
                "Turn failure not recorded"
            ),
        }
    }
}

/// Every recorded response so far, by round then submission time
fn transcript(debate: &Debate) -> Vec<TranscriptEntry> {
    debate
        .rounds()
        .iter()
        .flat_map(|round| {
            round.responses_by_time().into_iter().map(move |response| {
                let speaker = debate
                    .participant(response.participant_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                TranscriptEntry {
                    round: round.number,
                    speaker,
                    position: response.position.to_string(),
                    content: response.content.clone(),
                }
            })
        })
        .collect()
}
