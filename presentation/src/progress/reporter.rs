//! Progress reporting for automated debates

use agora_application::DebateProgressNotifier;
use agora_domain::{Debate, RoundAdvance, RoundClosure};
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports progress with one progress bar per round
pub struct ProgressReporter {
    multi: MultiProgress,
    round_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            round_bar: Mutex::new(None),
        }
    }

    fn round_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn closure_message(closure: &RoundClosure) -> String {
        let mut message = format!("{} responses", closure.response_count);
        if !closure.missed.is_empty() {
            message.push_str(&format!(", {} missed", closure.missed.len()));
        }
        if !closure.failed.is_empty() {
            message.push_str(&format!(", {} failed", closure.failed.len()));
        }
        if closure.timed_out {
            message.push_str(" (timed out)");
        }
        message
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DebateProgressNotifier for ProgressReporter {
    fn on_round_start(&self, round: u32, max_rounds: u32, turns: usize) {
        let pb = self.multi.add(ProgressBar::new(turns as u64));
        pb.set_style(Self::round_style());
        pb.set_prefix(format!("Round {}/{}", round, max_rounds));
        pb.set_message("Waiting for turns...");

        *self.round_bar.lock().unwrap_or_else(|e| e.into_inner()) = Some(pb);
    }

    fn on_turn_complete(&self, _round: u32, participant: &str, success: bool) {
        if let Some(pb) = self
            .round_bar
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            let status = if success {
                format!("{} {}", "v".green(), participant)
            } else {
                format!("{} {}", "x".red(), participant)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_round_complete(&self, closure: &RoundClosure) {
        if let Some(pb) = self
            .round_bar
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            pb.finish_with_message(format!(
                "{} {}",
                "complete:".green(),
                Self::closure_message(closure)
            ));
        }
    }

    fn on_debate_complete(&self, debate: &Debate) {
        let _ = self.multi.println(format!(
            "{} {} ({} responses)",
            "Debate finished:".green().bold(),
            debate.status(),
            debate.response_count()
        ));
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl DebateProgressNotifier for SimpleProgress {
    fn on_round_start(&self, round: u32, max_rounds: u32, turns: usize) {
        println!(
            "{} {} ({} turns)",
            "->".cyan(),
            format!("Round {}/{}", round, max_rounds).bold(),
            turns
        );
    }

    fn on_turn_complete(&self, _round: u32, participant: &str, success: bool) {
        if success {
            println!("  {} {}", "v".green(), participant);
        } else {
            println!("  {} {} (failed)", "x".red(), participant);
        }
    }

    fn on_round_complete(&self, closure: &RoundClosure) {
        println!(
            "  {}",
            ProgressReporter::closure_message(closure).dimmed()
        );
        if let RoundAdvance::DebateCompleted { reason } = &closure.advance {
            println!("{} {}", "Debate complete:".green().bold(), reason);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_domain::ParticipantId;

    fn closure(timed_out: bool) -> RoundClosure {
        RoundClosure {
            round_number: 2,
            response_count: 3,
            missed: vec![ParticipantId::new()],
            failed: Vec::new(),
            timed_out,
            advance: RoundAdvance::NextRound { number: 3 },
        }
    }

    #[test]
    fn test_closure_message() {
        assert_eq!(
            ProgressReporter::closure_message(&closure(false)),
            "3 responses, 1 missed"
        );
        assert_eq!(
            ProgressReporter::closure_message(&closure(true)),
            "3 responses, 1 missed (timed out)"
        );
    }

    #[test]
    fn test_reporter_tolerates_turns_without_round() {
        let reporter = ProgressReporter::new();
        reporter.on_turn_complete(1, "Ada", true);
        reporter.on_round_complete(&closure(false));

        reporter.on_round_start(1, 2, 2);
        reporter.on_turn_complete(1, "Ada", true);
        reporter.on_turn_complete(1, "Lin", false);
        reporter.on_round_complete(&closure(false));
        assert!(reporter.round_bar.lock().unwrap().is_none());
    }
}
