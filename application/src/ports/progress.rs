//! Progress notification port
//!
//! Defines the interface for reporting progress while a debate is driven
//! automatically.

use agora_domain::{Debate, RoundClosure};

/// Callback for progress updates during an automated debate
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait DebateProgressNotifier: Send + Sync {
    /// Called when a round starts with the number of automated turns
    fn on_round_start(&self, round: u32, max_rounds: u32, turns: usize);

    /// Called when a participant's turn finishes
    fn on_turn_complete(&self, round: u32, participant: &str, success: bool);

    /// Called when a round closes
    fn on_round_complete(&self, closure: &RoundClosure);

    /// Called once the debate has ended
    fn on_debate_complete(&self, _debate: &Debate) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl DebateProgressNotifier for NoProgress {
    fn on_round_start(&self, _round: u32, _max_rounds: u32, _turns: usize) {}
    fn on_turn_complete(&self, _round: u32, _participant: &str, _success: bool) {}
    fn on_round_complete(&self, _closure: &RoundClosure) {}
}
