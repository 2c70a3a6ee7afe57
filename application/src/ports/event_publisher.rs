//! Port for debate notifications.
//!
//! Defines the [`EventPublisherPort`] trait for broadcasting lifecycle
//! events (debate started, round completed, ...) to external listeners.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port carries the
//! machine-readable debate transcript.

use agora_domain::{DebateId, ParticipantId, ResponseId};
use serde::{Deserialize, Serialize};

/// A lifecycle notification for one debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DebateNotification {
    DebateStarted {
        debate_id: DebateId,
        topic: String,
        participants: usize,
        max_rounds: u32,
    },
    RoundStarted {
        debate_id: DebateId,
        round: u32,
        turn_order: Vec<ParticipantId>,
    },
    ResponseSubmitted {
        debate_id: DebateId,
        round: u32,
        participant_id: ParticipantId,
        response_id: ResponseId,
        response_time_ms: u64,
        flagged: bool,
    },
    TurnFailed {
        debate_id: DebateId,
        round: u32,
        participant_id: ParticipantId,
        reason: String,
        retryable: bool,
    },
    RoundCompleted {
        debate_id: DebateId,
        round: u32,
        responses: usize,
        missed: Vec<ParticipantId>,
        failed: Vec<ParticipantId>,
        timed_out: bool,
    },
    DebateCompleted {
        debate_id: DebateId,
        rounds: u32,
        responses: usize,
        reason: String,
    },
    DebateArchived {
        debate_id: DebateId,
    },
    DebateFailed {
        debate_id: DebateId,
        reason: String,
    },
}

impl DebateNotification {
    /// Event type identifier (matches the serialized `type` tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            DebateNotification::DebateStarted { .. } => "debate_started",
            DebateNotification::RoundStarted { .. } => "round_started",
            DebateNotification::ResponseSubmitted { .. } => "response_submitted",
            DebateNotification::TurnFailed { .. } => "turn_failed",
            DebateNotification::RoundCompleted { .. } => "round_completed",
            DebateNotification::DebateCompleted { .. } => "debate_completed",
            DebateNotification::DebateArchived { .. } => "debate_archived",
            DebateNotification::DebateFailed { .. } => "debate_failed",
        }
    }

    pub fn debate_id(&self) -> DebateId {
        match self {
            DebateNotification::DebateStarted { debate_id, .. }
            | DebateNotification::RoundStarted { debate_id, .. }
            | DebateNotification::ResponseSubmitted { debate_id, .. }
            | DebateNotification::TurnFailed { debate_id, .. }
            | DebateNotification::RoundCompleted { debate_id, .. }
            | DebateNotification::DebateCompleted { debate_id, .. }
            | DebateNotification::DebateArchived { debate_id }
            | DebateNotification::DebateFailed { debate_id, .. } => *debate_id,
        }
    }
}

/// Port for publishing debate notifications.
///
/// `publish` is synchronous and non-fallible so a broken listener never
/// disrupts a debate; implementations swallow (and log) their own errors.
/// Events for one debate are published in order while the debate is locked.
pub trait EventPublisherPort: Send + Sync {
    fn publish(&self, event: &DebateNotification);
}

/// No-op implementation for tests and when notifications are disabled.
pub struct NoEventPublisher;

impl EventPublisherPort for NoEventPublisher {
    fn publish(&self, _event: &DebateNotification) {}
}
