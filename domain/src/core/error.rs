//! Domain error types

use crate::debate::state::{DebateEvent, DebateStatus};
use thiserror::Error;

/// Domain-level errors
///
/// Every variant describes caller misuse or an invariant violation. None of
/// them are retried: they are returned to the caller immediately and the
/// aggregate is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid transition: {event} is not allowed in state {from}")]
    StateTransition {
        from: DebateStatus,
        event: DebateEvent,
    },

    #[error("Participant {participant} already responded in round {round}")]
    DuplicateResponse { participant: String, round: u32 },

    #[error("Participant {0} is not part of this debate")]
    ParticipantNotInDebate(String),

    #[error("Round {0} is closed")]
    RoundClosed(u32),

    #[error("Participant {0} is inactive")]
    ParticipantInactive(String),

    #[error("Debate no longer accepts participants (status {0})")]
    RegistrationClosed(DebateStatus),

    #[error("Debate already has the maximum of {0} participants")]
    ParticipantLimitReached(usize),

    #[error("Quorum not met: {0}")]
    QuorumNotMet(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid topic: {0}")]
    InvalidTopic(String),
}

impl DomainError {
    /// Shorthand for building a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        DomainError::Configuration(message.into())
    }

    /// Whether this error is a turn race (duplicate or late submission)
    pub fn is_turn_race(&self) -> bool {
        matches!(
            self,
            DomainError::DuplicateResponse { .. } | DomainError::RoundClosed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_display() {
        let error = DomainError::StateTransition {
            from: DebateStatus::Created,
            event: DebateEvent::Start,
        };
        assert_eq!(
            error.to_string(),
            "Invalid transition: START is not allowed in state CREATED"
        );
    }

    #[test]
    fn test_is_turn_race() {
        assert!(
            DomainError::DuplicateResponse {
                participant: "a".to_string(),
                round: 1
            }
            .is_turn_race()
        );
        assert!(DomainError::RoundClosed(2).is_turn_race());
        assert!(!DomainError::config("bad").is_turn_race());
    }
}
