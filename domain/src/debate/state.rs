//! Debate lifecycle state machine
//!
//! The lifecycle is an explicit transition table. Conditional edges (a
//! response is only accepted while its round is open, a new round may only
//! start below `max_rounds`) are guard functions on the
//! [`Debate`](super::entities::Debate) aggregate; this module only knows
//! which `(state, event)` pairs are legal.
//!
//! ```text
//! CREATED ──INITIALIZE──▶ INITIALIZED ──START──▶ IN_PROGRESS ◀─┐ SUBMIT_RESPONSE
//!                                                  │   ▲       │
//!                                     COMPLETE_ROUND   START ──┘
//!                                                  ▼   │
//!                                            ROUND_COMPLETE ──END_DEBATE──▶ DEBATE_COMPLETE ──ARCHIVE──▶ ARCHIVED
//!
//! IN_PROGRESS | ROUND_COMPLETE ──ERROR──▶ ERROR
//! ```

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebateStatus {
    Created,
    Initialized,
    InProgress,
    RoundComplete,
    DebateComplete,
    Archived,
    Error,
}

impl DebateStatus {
    pub const ALL: [DebateStatus; 7] = [
        DebateStatus::Created,
        DebateStatus::Initialized,
        DebateStatus::InProgress,
        DebateStatus::RoundComplete,
        DebateStatus::DebateComplete,
        DebateStatus::Archived,
        DebateStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DebateStatus::Created => "CREATED",
            DebateStatus::Initialized => "INITIALIZED",
            DebateStatus::InProgress => "IN_PROGRESS",
            DebateStatus::RoundComplete => "ROUND_COMPLETE",
            DebateStatus::DebateComplete => "DEBATE_COMPLETE",
            DebateStatus::Archived => "ARCHIVED",
            DebateStatus::Error => "ERROR",
        }
    }

    /// Terminal states accept no further events
    pub fn is_terminal(&self) -> bool {
        matches!(self, DebateStatus::Archived | DebateStatus::Error)
    }

    /// Whether rounds are being played (a round is open or just closed)
    pub fn is_running(&self) -> bool {
        matches!(self, DebateStatus::InProgress | DebateStatus::RoundComplete)
    }
}

impl std::fmt::Display for DebateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Events driving the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebateEvent {
    Initialize,
    Start,
    SubmitResponse,
    CompleteRound,
    EndDebate,
    Archive,
    Error,
}

impl DebateEvent {
    pub const ALL: [DebateEvent; 7] = [
        DebateEvent::Initialize,
        DebateEvent::Start,
        DebateEvent::SubmitResponse,
        DebateEvent::CompleteRound,
        DebateEvent::EndDebate,
        DebateEvent::Archive,
        DebateEvent::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DebateEvent::Initialize => "INITIALIZE",
            DebateEvent::Start => "START",
            DebateEvent::SubmitResponse => "SUBMIT_RESPONSE",
            DebateEvent::CompleteRound => "COMPLETE_ROUND",
            DebateEvent::EndDebate => "END_DEBATE",
            DebateEvent::Archive => "ARCHIVE",
            DebateEvent::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for DebateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Look up the target state for `event` fired in state `from`.
///
/// Returns [`DomainError::StateTransition`] for every pair missing from the
/// table. The function is pure: rejecting an event never mutates anything.
pub fn transition(from: DebateStatus, event: DebateEvent) -> Result<DebateStatus, DomainError> {
    use DebateEvent as E;
    use DebateStatus as S;

    let to = match (from, event) {
        (S::Created, E::Initialize) => S::Initialized,
        (S::Initialized, E::Start) => S::InProgress,
        (S::InProgress, E::SubmitResponse) => S::InProgress,
        (S::InProgress, E::CompleteRound) => S::RoundComplete,
        (S::RoundComplete, E::Start) => S::InProgress,
        (S::RoundComplete, E::EndDebate) => S::DebateComplete,
        (S::DebateComplete, E::Archive) => S::Archived,
        (S::InProgress | S::RoundComplete, E::Error) => S::Error,
        _ => return Err(DomainError::StateTransition { from, event }),
    };
    Ok(to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashSet, VecDeque};

    fn successors(state: DebateStatus) -> Vec<DebateStatus> {
        DebateEvent::ALL
            .iter()
            .filter_map(|e| transition(state, *e).ok())
            .collect()
    }

    #[test]
    fn test_happy_path() {
        let mut state = DebateStatus::Created;
        for event in [
            DebateEvent::Initialize,
            DebateEvent::Start,
            DebateEvent::SubmitResponse,
            DebateEvent::CompleteRound,
            DebateEvent::Start,
            DebateEvent::CompleteRound,
            DebateEvent::EndDebate,
            DebateEvent::Archive,
        ] {
            state = transition(state, event).unwrap();
        }
        assert_eq!(state, DebateStatus::Archived);
    }

    #[test]
    fn test_invalid_pair_is_rejected() {
        let err = transition(DebateStatus::Created, DebateEvent::Start).unwrap_err();
        assert!(matches!(err, DomainError::StateTransition { .. }));
        assert!(transition(DebateStatus::Initialized, DebateEvent::Error).is_err());
        assert!(transition(DebateStatus::DebateComplete, DebateEvent::Error).is_err());
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for state in DebateStatus::ALL.iter().filter(|s| s.is_terminal()) {
            assert!(successors(*state).is_empty(), "{} has exits", state);
        }
    }

    /// Every state reachable from CREATED can still reach a terminal state,
    /// and every maximal path ends in exactly one of ARCHIVED or ERROR.
    #[test]
    fn test_every_reachable_state_can_terminate() {
        let mut reachable = HashSet::new();
        let mut queue = VecDeque::from([DebateStatus::Created]);
        while let Some(state) = queue.pop_front() {
            if reachable.insert(state) {
                queue.extend(successors(state));
            }
        }

        for state in &reachable {
            let mut seen = HashSet::new();
            let mut queue = VecDeque::from([*state]);
            let mut terminals = HashSet::new();
            while let Some(s) = queue.pop_front() {
                if !seen.insert(s) {
                    continue;
                }
                if s.is_terminal() {
                    terminals.insert(s);
                }
                queue.extend(successors(s));
            }
            assert!(!terminals.is_empty(), "{} cannot terminate", state);
        }

        assert!(reachable.contains(&DebateStatus::Archived));
        assert!(reachable.contains(&DebateStatus::Error));
    }

    /// Enumerates every event sequence up to a bounded length and checks that
    /// no sequence visits both terminal states.
    #[test]
    fn test_paths_never_reach_both_terminals() {
        fn walk(state: DebateStatus, depth: usize, visited_terminal: Option<DebateStatus>) {
            if let Some(t) = visited_terminal {
                assert!(successors(state).is_empty());
                assert_eq!(state, t);
                return;
            }
            if depth == 0 {
                return;
            }
            for next in successors(state) {
                let terminal = next.is_terminal().then_some(next);
                walk(next, depth - 1, terminal);
            }
        }
        walk(DebateStatus::Created, 12, None);
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&DebateStatus::RoundComplete).unwrap();
        assert_eq!(json, "\"ROUND_COMPLETE\"");
    }
}
