//! Pluggable early-termination policies
//!
//! After every completed round the aggregate ends the debate when
//! `current_round == max_rounds`. Before that point a [`TerminationPolicy`]
//! may ask for an early stop. Quality assessment lives outside the core, so
//! the default policy never stops early.

use crate::debate::entities::Debate;

/// Outcome of a policy check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationDecision {
    Continue,
    Stop { reason: String },
}

impl TerminationDecision {
    pub fn stop(reason: impl Into<String>) -> Self {
        TerminationDecision::Stop {
            reason: reason.into(),
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, TerminationDecision::Stop { .. })
    }
}

/// Decides whether a debate should end before `max_rounds`.
///
/// Called with the debate in `ROUND_COMPLETE`, after the round that just
/// closed has been recorded.
pub trait TerminationPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, debate: &Debate) -> TerminationDecision;
}

/// Never terminates early
#[derive(Debug, Clone, Copy, Default)]
pub struct RunToMaxRounds;

impl TerminationPolicy for RunToMaxRounds {
    fn name(&self) -> &'static str {
        "run_to_max_rounds"
    }

    fn evaluate(&self, _debate: &Debate) -> TerminationDecision {
        TerminationDecision::Continue
    }
}

/// Ends the debate when a whole round closes without a single response
#[derive(Debug, Clone, Copy, Default)]
pub struct StopWhenSilent;

impl TerminationPolicy for StopWhenSilent {
    fn name(&self) -> &'static str {
        "stop_when_silent"
    }

    fn evaluate(&self, debate: &Debate) -> TerminationDecision {
        match debate.rounds().last() {
            Some(round) if !round.is_open() && round.responses.is_empty() => {
                TerminationDecision::stop(format!("round {} produced no responses", round.number))
            }
            _ => TerminationDecision::Continue,
        }
    }
}
