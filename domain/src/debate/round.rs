//! Rounds, turn slots and recorded responses

use crate::core::error::DomainError;
use crate::core::ids::{ExecutionId, ParticipantId, ResponseId, RoundId};
use crate::debate::participant::Position;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Status of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundStatus {
    Open,
    Completed,
}

/// State of one participant's turn within a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TurnState {
    /// Not attempted yet
    Pending,
    /// A response was recorded
    Answered { response_id: ResponseId },
    /// Attempted but failed (provider unavailable, flow error); may be retried
    /// while the round is open
    Failed { reason: String, retryable: bool },
    /// Round closed before the participant answered
    Missed,
}

impl TurnState {
    pub fn is_answered(&self) -> bool {
        matches!(self, TurnState::Answered { .. })
    }
}

/// One participant's slot in a round, kept in turn order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSlot {
    pub participant_id: ParticipantId,
    pub state: TurnState,
}

/// Content produced for a turn, before it is recorded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDraft {
    pub content: String,
    /// Set when the producing flow or a moderation hook marked the content
    pub flagged: bool,
    /// Execution record of the agentic flow that produced the content
    pub execution_id: Option<ExecutionId>,
}

impl ResponseDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn flagged(mut self, flagged: bool) -> Self {
        self.flagged = flagged;
        self
    }

    pub fn with_execution(mut self, execution_id: ExecutionId) -> Self {
        self.execution_id = Some(execution_id);
        self
    }
}

/// A recorded response. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: ResponseId,
    pub participant_id: ParticipantId,
    pub position: Position,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
    /// Milliseconds between round start and submission
    pub response_time_ms: u64,
    pub flagged: bool,
    pub execution_id: Option<ExecutionId>,
}

/// One cycle in which every eligible participant may respond once (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub number: u32,
    pub status: RoundStatus,
    pub slots: Vec<TurnSlot>,
    pub responses: Vec<Response>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether the round was closed by its time budget
    pub timed_out: bool,
}

impl Round {
    /// Open a new round for the given turn order
    pub fn open(number: u32, turn_order: &[ParticipantId], now: DateTime<Utc>) -> Self {
        Self {
            id: RoundId::new(),
            number,
            status: RoundStatus::Open,
            slots: turn_order
                .iter()
                .map(|id| TurnSlot {
                    participant_id: *id,
                    state: TurnState::Pending,
                })
                .collect(),
            responses: Vec::new(),
            started_at: now,
            completed_at: None,
            timed_out: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == RoundStatus::Open
    }

    pub fn turn_order(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.slots.iter().map(|s| s.participant_id)
    }

    pub fn slot(&self, participant: ParticipantId) -> Option<&TurnSlot> {
        self.slots.iter().find(|s| s.participant_id == participant)
    }

    fn slot_mut(&mut self, participant: ParticipantId) -> Option<&mut TurnSlot> {
        self.slots
            .iter_mut()
            .find(|s| s.participant_id == participant)
    }

    pub fn has_answered(&self, participant: ParticipantId) -> bool {
        self.slot(participant).is_some_and(|s| s.state.is_answered())
    }

    /// Every eligible participant has answered or forfeited the turn
    pub fn is_complete(&self) -> bool {
        !self.slots.is_empty()
            && self
                .slots
                .iter()
                .all(|s| s.state.is_answered() || s.state == TurnState::Missed)
    }

    /// Participants whose turn is still pending or retryable, in turn order
    pub fn awaiting(&self) -> Vec<ParticipantId> {
        self.slots
            .iter()
            .filter(|s| !s.state.is_answered() && s.state != TurnState::Missed)
            .map(|s| s.participant_id)
            .collect()
    }

    /// Point in time at which the round budget runs out
    pub fn deadline(&self, limit: Option<Duration>) -> Option<DateTime<Utc>> {
        let limit = ChronoDuration::from_std(limit?).ok()?;
        Some(self.started_at + limit)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>, limit: Option<Duration>) -> bool {
        self.deadline(limit).is_some_and(|deadline| now >= deadline)
    }

    /// Check that `participant` may submit now
    pub fn ensure_can_submit(&self, participant: ParticipantId) -> Result<(), DomainError> {
        if !self.is_open() {
            return Err(DomainError::RoundClosed(self.number));
        }
        let slot = self
            .slot(participant)
            .ok_or_else(|| DomainError::ParticipantNotInDebate(participant.to_string()))?;
        match &slot.state {
            TurnState::Answered { .. } => Err(DomainError::DuplicateResponse {
                participant: participant.to_string(),
                round: self.number,
            }),
            TurnState::Missed => Err(DomainError::RoundClosed(self.number)),
            TurnState::Pending | TurnState::Failed { .. } => Ok(()),
        }
    }

    /// Record a response for `participant`
    pub(crate) fn record(
        &mut self,
        participant: ParticipantId,
        position: Position,
        draft: ResponseDraft,
        now: DateTime<Utc>,
    ) -> Result<Response, DomainError> {
        self.ensure_can_submit(participant)?;

        let response = Response {
            id: ResponseId::new(),
            participant_id: participant,
            position,
            content: draft.content,
            submitted_at: now,
            response_time_ms: (now - self.started_at).num_milliseconds().max(0) as u64,
            flagged: draft.flagged,
            execution_id: draft.execution_id,
        };

        if let Some(slot) = self.slot_mut(participant) {
            slot.state = TurnState::Answered {
                response_id: response.id,
            };
        }
        self.responses.push(response.clone());
        Ok(response)
    }

    /// Mark a turn as failed. The slot stays eligible for a retry.
    pub(crate) fn record_failure(
        &mut self,
        participant: ParticipantId,
        reason: impl Into<String>,
        retryable: bool,
    ) -> Result<(), DomainError> {
        self.ensure_can_submit(participant)?;
        if let Some(slot) = self.slot_mut(participant) {
            slot.state = TurnState::Failed {
                reason: reason.into(),
                retryable,
            };
        }
        Ok(())
    }

    /// Forfeit an unanswered turn. Returns whether the slot changed.
    pub(crate) fn withdraw(&mut self, participant: ParticipantId) -> bool {
        match self.slot_mut(participant) {
            Some(slot) if matches!(slot.state, TurnState::Pending | TurnState::Failed { .. }) => {
                slot.state = TurnState::Missed;
                true
            }
            _ => false,
        }
    }

    /// Close the round. Pending slots become [`TurnState::Missed`]; failed
    /// slots keep their failure so they stay distinguishable. Returns the
    /// participants marked missed.
    pub(crate) fn close(&mut self, now: DateTime<Utc>, timed_out: bool) -> Vec<ParticipantId> {
        let mut missed = Vec::new();
        for slot in &mut self.slots {
            if slot.state == TurnState::Pending {
                slot.state = TurnState::Missed;
                missed.push(slot.participant_id);
            }
        }
        self.status = RoundStatus::Completed;
        self.completed_at = Some(now);
        self.timed_out = timed_out;
        missed
    }

    pub fn missed(&self) -> Vec<ParticipantId> {
        self.slots
            .iter()
            .filter(|s| s.state == TurnState::Missed)
            .map(|s| s.participant_id)
            .collect()
    }

    pub fn failed(&self) -> Vec<ParticipantId> {
        self.slots
            .iter()
            .filter(|s| matches!(s.state, TurnState::Failed { .. }))
            .map(|s| s.participant_id)
            .collect()
    }

    /// Responses ordered by submission time (display only)
    pub fn responses_by_time(&self) -> Vec<&Response> {
        let mut responses: Vec<&Response> = self.responses.iter().collect();
        responses.sort_by_key(|r| r.submitted_at);
        responses
    }
}
