//! The Debate aggregate
//!
//! A [`Debate`] exclusively owns its participants, rounds and responses.
//! Every mutation goes through a method that first consults the lifecycle
//! table ([`transition`]) and its guards; a rejected call leaves the
//! aggregate untouched.
//!
//! Time is always passed in (`now`) so callers decide the clock and tests
//! stay deterministic.

use crate::core::error::DomainError;
use crate::core::ids::{DebateId, ParticipantId};
use crate::debate::config::DebateConfig;
use crate::debate::participant::{NewParticipant, Participant};
use crate::debate::round::{Response, ResponseDraft, Round};
use crate::debate::state::{DebateEvent, DebateStatus, transition};
use crate::debate::termination::{TerminationDecision, TerminationPolicy};
use crate::debate::turn_order::TurnOrder;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happened after a round closed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundAdvance {
    /// The next round was opened
    NextRound { number: u32 },
    /// The debate ended
    DebateCompleted { reason: String },
}

/// Summary of a round closing (exactly one per round)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundClosure {
    pub round_number: u32,
    pub response_count: usize,
    pub missed: Vec<ParticipantId>,
    pub failed: Vec<ParticipantId>,
    pub timed_out: bool,
    pub advance: RoundAdvance,
}

impl RoundClosure {
    pub fn debate_completed(&self) -> bool {
        matches!(self.advance, RoundAdvance::DebateCompleted { .. })
    }
}

/// Result of an accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub response: Response,
    /// Present when this submission was the last one the round waited for
    pub closure: Option<RoundClosure>,
}

/// A generated turn pinned to the round it started in.
///
/// Generation may run past the round deadline: the result is still
/// accepted until `deadline + grace` as long as the turn started in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnTicket {
    pub round: u32,
    pub started_at: DateTime<Utc>,
    pub grace: Duration,
}

impl TurnTicket {
    pub fn new(round: u32, started_at: DateTime<Utc>, grace: Duration) -> Self {
        Self {
            round,
            started_at,
            grace,
        }
    }

    /// Whether a result arriving at `now` still counts for `round`
    fn admits(&self, round: &Round, limit: Option<Duration>, now: DateTime<Utc>) -> bool {
        let Some(deadline) = round.deadline(limit) else {
            return true;
        };
        let grace = ChronoDuration::from_std(self.grace).unwrap_or_default();
        self.started_at < deadline && now < deadline + grace
    }
}

/// One structured multi-party exchange on a topic (Aggregate root)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debate {
    id: DebateId,
    topic: String,
    status: DebateStatus,
    config: DebateConfig,
    participants: Vec<Participant>,
    rounds: Vec<Round>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    archived_at: Option<DateTime<Utc>>,
    completion_reason: Option<String>,
    error: Option<String>,
}

impl Debate {
    /// Create a debate in `CREATED`
    pub fn new(
        topic: impl Into<String>,
        config: DebateConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(DomainError::InvalidTopic("topic cannot be empty".to_string()));
        }
        config.validate()?;

        Ok(Self {
            id: DebateId::new(),
            topic: topic.trim().to_string(),
            status: DebateStatus::Created,
            config,
            participants: Vec::new(),
            rounds: Vec::new(),
            created_at: now,
            started_at: None,
            completed_at: None,
            archived_at: None,
            completion_reason: None,
            error: None,
        })
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> DebateId {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn status(&self) -> DebateStatus {
        self.status
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    /// Number of the latest round (0 before the debate starts)
    pub fn current_round(&self) -> u32 {
        self.rounds.last().map(|r| r.number).unwrap_or(0)
    }

    /// The round currently accepting responses
    pub fn open_round(&self) -> Option<&Round> {
        self.rounds.last().filter(|r| r.is_open())
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at
    }

    pub fn completion_reason(&self) -> Option<&str> {
        self.completion_reason.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// All responses across all rounds
    pub fn responses(&self) -> impl Iterator<Item = &Response> {
        self.rounds.iter().flat_map(|r| r.responses.iter())
    }

    pub fn response_count(&self) -> usize {
        self.rounds.iter().map(|r| r.responses.len()).sum()
    }

    // ==================== Registry ====================

    /// Register a participant. Allowed until the debate starts.
    pub fn join(
        &mut self,
        request: NewParticipant,
        now: DateTime<Utc>,
    ) -> Result<ParticipantId, DomainError> {
        if !matches!(
            self.status,
            DebateStatus::Created | DebateStatus::Initialized
        ) {
            return Err(DomainError::RegistrationClosed(self.status));
        }
        if request.name.trim().is_empty() {
            return Err(DomainError::config("participant name cannot be empty"));
        }
        if request.position.as_str().is_empty() {
            return Err(DomainError::config("participant position cannot be empty"));
        }
        let active = self.participants.iter().filter(|p| p.active).count();
        if active >= self.config.max_participants {
            return Err(DomainError::ParticipantLimitReached(
                self.config.max_participants,
            ));
        }

        let participant = Participant::from_request(request, now);
        let id = participant.id;
        self.participants.push(participant);
        Ok(id)
    }

    /// Activate or deactivate a participant.
    ///
    /// Activation takes effect from the next round. A participant
    /// deactivated while a round is open forfeits that turn: a pending or
    /// failed slot becomes missed, which may complete the round.
    pub fn set_active(
        &mut self,
        id: ParticipantId,
        active: bool,
        now: DateTime<Utc>,
        policy: &dyn TerminationPolicy,
    ) -> Result<Option<RoundClosure>, DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::RegistrationClosed(self.status));
        }
        let participant = self
            .participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DomainError::ParticipantNotInDebate(id.to_string()))?;
        participant.active = active;

        if active || self.status != DebateStatus::InProgress {
            return Ok(None);
        }
        let Some(round) = self.rounds.last_mut().filter(|r| r.is_open()) else {
            return Ok(None);
        };
        if !round.withdraw(id) || !round.is_complete() {
            return Ok(None);
        }
        self.complete_round(now, false, policy).map(Some)
    }

    /// Turn order for the next round
    pub fn turn_order(&self) -> Vec<ParticipantId> {
        TurnOrder::compute(&self.participants, self.config.require_balanced_positions)
    }

    // ==================== Lifecycle ====================

    fn apply(&mut self, event: DebateEvent) -> Result<DebateStatus, DomainError> {
        let next = transition(self.status, event)?;
        self.status = next;
        Ok(next)
    }

    /// CREATED → INITIALIZED, once the participant quorum is met
    pub fn initialize(&mut self) -> Result<(), DomainError> {
        transition(self.status, DebateEvent::Initialize)?;
        self.check_quorum()?;
        self.apply(DebateEvent::Initialize)?;
        Ok(())
    }

    fn check_quorum(&self) -> Result<(), DomainError> {
        let active = self.participants.iter().filter(|p| p.active).count();
        if active < self.config.min_participants {
            return Err(DomainError::QuorumNotMet(format!(
                "{} active participants, {} required",
                active, self.config.min_participants
            )));
        }
        if active > self.config.max_participants {
            return Err(DomainError::QuorumNotMet(format!(
                "{} active participants, at most {} allowed",
                active, self.config.max_participants
            )));
        }
        if self.config.require_balanced_positions && !TurnOrder::is_balanced(&self.participants)
        {
            return Err(DomainError::QuorumNotMet(
                "positions are not balanced".to_string(),
            ));
        }
        Ok(())
    }

    /// INITIALIZED → IN_PROGRESS (round 1) or ROUND_COMPLETE → IN_PROGRESS
    /// (next round). Refused once `max_rounds` have been played.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<u32, DomainError> {
        transition(self.status, DebateEvent::Start)?;
        if self.current_round() >= self.config.max_rounds {
            return Err(DomainError::StateTransition {
                from: self.status,
                event: DebateEvent::Start,
            });
        }
        let order = self.turn_order();
        if order.is_empty() {
            return Err(DomainError::QuorumNotMet(
                "no active participants".to_string(),
            ));
        }

        self.apply(DebateEvent::Start)?;
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        let number = self.current_round() + 1;
        self.rounds.push(Round::open(number, &order, now));
        Ok(number)
    }

    /// Check that a submission for `participant` would be accepted now.
    ///
    /// `expected_round` pins the submission to the round the turn started
    /// in; a turn that outlived its round is rejected as late.
    pub fn ensure_can_submit(
        &self,
        participant: ParticipantId,
        expected_round: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<&Round, DomainError> {
        let round = self.check_turn(participant, expected_round)?;
        if round.is_overdue(now, self.config.round_time_limit()) {
            return Err(DomainError::RoundClosed(round.number));
        }
        Ok(round)
    }

    /// Like [`Debate::ensure_can_submit`], for a generated turn that may land
    /// inside its grace window
    pub fn ensure_ticket_admitted(
        &self,
        participant: ParticipantId,
        ticket: &TurnTicket,
        now: DateTime<Utc>,
    ) -> Result<&Round, DomainError> {
        let round = self.check_turn(participant, Some(ticket.round))?;
        if !ticket.admits(round, self.config.round_time_limit(), now) {
            return Err(DomainError::RoundClosed(round.number));
        }
        Ok(round)
    }

    /// Lifecycle, membership and slot checks, without the clock
    fn check_turn(
        &self,
        participant: ParticipantId,
        expected_round: Option<u32>,
    ) -> Result<&Round, DomainError> {
        transition(self.status, DebateEvent::SubmitResponse)?;
        let p = self
            .participant(participant)
            .ok_or_else(|| DomainError::ParticipantNotInDebate(participant.to_string()))?;
        if !p.active {
            return Err(DomainError::ParticipantInactive(participant.to_string()));
        }
        let round = self
            .rounds
            .last()
            .ok_or(DomainError::RoundClosed(0))?;
        if let Some(expected) = expected_round
            && expected != round.number
        {
            return Err(DomainError::RoundClosed(expected));
        }
        round.ensure_can_submit(participant)?;
        Ok(round)
    }

    /// SUBMIT_RESPONSE: record a response; closes the round when it was the
    /// last one outstanding and advances the debate.
    pub fn submit_response(
        &mut self,
        participant: ParticipantId,
        draft: ResponseDraft,
        expected_round: Option<u32>,
        now: DateTime<Utc>,
        policy: &dyn TerminationPolicy,
    ) -> Result<SubmitOutcome, DomainError> {
        self.ensure_can_submit(participant, expected_round, now)?;
        self.record_response(participant, draft, now, policy)
    }

    /// SUBMIT_RESPONSE for a generated turn, accepted within its grace window
    pub fn submit_generated(
        &mut self,
        participant: ParticipantId,
        draft: ResponseDraft,
        ticket: &TurnTicket,
        now: DateTime<Utc>,
        policy: &dyn TerminationPolicy,
    ) -> Result<SubmitOutcome, DomainError> {
        self.ensure_ticket_admitted(participant, ticket, now)?;
        self.record_response(participant, draft, now, policy)
    }

    fn record_response(
        &mut self,
        participant: ParticipantId,
        draft: ResponseDraft,
        now: DateTime<Utc>,
        policy: &dyn TerminationPolicy,
    ) -> Result<SubmitOutcome, DomainError> {
        let position = self
            .participant(participant)
            .map(|p| p.position.clone())
            .ok_or_else(|| DomainError::ParticipantNotInDebate(participant.to_string()))?;

        let round = self
            .rounds
            .last_mut()
            .ok_or(DomainError::RoundClosed(0))?;
        let response = round.record(participant, position, draft, now)?;
        let complete = round.is_complete();

        if let Some(p) = self.participants.iter_mut().find(|p| p.id == participant) {
            p.response_count += 1;
        }
        self.apply(DebateEvent::SubmitResponse)?;

        let closure = if complete {
            Some(self.complete_round(now, false, policy)?)
        } else {
            None
        };

        Ok(SubmitOutcome { response, closure })
    }

    /// Mark a participant's turn as failed (not missing). The slot can be
    /// retried while the round is open.
    ///
    /// Recorded until the round actually closes, deadline or not.
    pub fn record_turn_failure(
        &mut self,
        participant: ParticipantId,
        reason: impl Into<String>,
        retryable: bool,
        expected_round: Option<u32>,
    ) -> Result<(), DomainError> {
        self.check_turn(participant, expected_round)?;
        let round = self
            .rounds
            .last_mut()
            .ok_or(DomainError::RoundClosed(0))?;
        round.record_failure(participant, reason, retryable)
    }

    /// Close the current round once its time budget and `grace` have run out.
    pub fn expire_overdue(
        &mut self,
        now: DateTime<Utc>,
        grace: Duration,
        policy: &dyn TerminationPolicy,
    ) -> Result<Option<RoundClosure>, DomainError> {
        let limit = self.config.round_time_limit().map(|limit| limit + grace);
        let overdue = self.status == DebateStatus::InProgress
            && self.open_round().is_some_and(|r| r.is_overdue(now, limit));
        if !overdue {
            return Ok(None);
        }
        self.complete_round(now, true, policy).map(Some)
    }

    /// Force completion of round `number` (round timer / operator).
    ///
    /// Idempotent: returns `None` when that round is no longer open, so a
    /// round is closed exactly once no matter how many callers race.
    pub fn force_complete_round(
        &mut self,
        number: u32,
        now: DateTime<Utc>,
        policy: &dyn TerminationPolicy,
    ) -> Result<Option<RoundClosure>, DomainError> {
        let is_target = self.status == DebateStatus::InProgress
            && self.open_round().is_some_and(|r| r.number == number);
        if !is_target {
            return Ok(None);
        }
        self.complete_round(now, true, policy).map(Some)
    }

    /// COMPLETE_ROUND followed by START (next round) or END_DEBATE
    fn complete_round(
        &mut self,
        now: DateTime<Utc>,
        timed_out: bool,
        policy: &dyn TerminationPolicy,
    ) -> Result<RoundClosure, DomainError> {
        transition(self.status, DebateEvent::CompleteRound)?;
        let round = self
            .rounds
            .last_mut()
            .ok_or(DomainError::RoundClosed(0))?;
        round.close(now, timed_out);
        let missed = round.missed();
        let failed = round.failed();
        let round_number = round.number;
        let response_count = round.responses.len();
        self.apply(DebateEvent::CompleteRound)?;

        let advance = self.advance(now, policy)?;
        Ok(RoundClosure {
            round_number,
            response_count,
            missed,
            failed,
            timed_out,
            advance,
        })
    }

    fn advance(
        &mut self,
        now: DateTime<Utc>,
        policy: &dyn TerminationPolicy,
    ) -> Result<RoundAdvance, DomainError> {
        let reason = if self.current_round() >= self.config.max_rounds {
            Some(format!("max rounds ({}) reached", self.config.max_rounds))
        } else if let TerminationDecision::Stop { reason } = policy.evaluate(self) {
            Some(reason)
        } else if self.turn_order().is_empty() {
            Some("no active participants left".to_string())
        } else {
            None
        };

        match reason {
            Some(reason) => {
                self.apply(DebateEvent::EndDebate)?;
                self.completed_at = Some(now);
                self.completion_reason = Some(reason.clone());
                Ok(RoundAdvance::DebateCompleted { reason })
            }
            None => {
                let number = self.start(now)?;
                Ok(RoundAdvance::NextRound { number })
            }
        }
    }

    /// DEBATE_COMPLETE → ARCHIVED
    pub fn archive(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.apply(DebateEvent::Archive)?;
        self.archived_at = Some(now);
        Ok(())
    }

    /// IN_PROGRESS | ROUND_COMPLETE → ERROR. Recorded responses are kept.
    pub fn fail(
        &mut self,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.apply(DebateEvent::Error)?;
        if let Some(round) = self.rounds.last_mut()
            && round.is_open()
        {
            round.close(now, false);
        }
        self.completed_at = Some(now);
        self.error = Some(reason.into());
        Ok(())
    }
}
