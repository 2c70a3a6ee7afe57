//! Console output formatter for debate snapshots

use agora_domain::{Debate, Participant, ParticipantId, Round, TurnState};
use colored::Colorize;

/// Formats debate snapshots for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete debate: every round, every turn
    pub fn format(debate: &Debate) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Debate Transcript"));
        output.push('\n');

        output.push_str(&format!("{} {}\n\n", "Topic:".cyan().bold(), debate.topic()));

        output.push_str(&format!("{}\n", "Participants:".cyan().bold()));
        for participant in debate.participants() {
            output.push_str(&format!("  * {}\n", Self::describe(participant)));
        }

        for round in debate.rounds() {
            output.push_str(&Self::section_header(&Self::round_title(round)));
            for slot in &round.slots {
                let name = Self::name_of(debate, slot.participant_id);
                match &slot.state {
                    TurnState::Answered { response_id } => {
                        let Some(response) = round.responses.iter().find(|r| r.id == *response_id)
                        else {
                            continue;
                        };
                        let mut title = format!("── {} [{}] ──", name, response.position);
                        if response.flagged {
                            title.push_str(" (flagged)");
                        }
                        output.push_str(&format!(
                            "\n{}\n{}\n",
                            title.yellow().bold(),
                            Self::indent(&response.content, "  ")
                        ));
                    }
                    TurnState::Failed { reason, .. } => {
                        output.push_str(&format!(
                            "\n{}\n  Failed: {}\n",
                            format!("── {} ──", name).red().bold(),
                            reason
                        ));
                    }
                    TurnState::Missed => {
                        output.push_str(&format!(
                            "\n{}\n",
                            format!("── {} ── missed", name).dimmed()
                        ));
                    }
                    TurnState::Pending => {
                        output.push_str(&format!(
                            "\n{}\n",
                            format!("── {} ── waiting", name).dimmed()
                        ));
                    }
                }
            }
        }

        output.push_str(&Self::section_header("Outcome"));
        output.push_str(&Self::outcome(debate));
        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(debate: &Debate) -> String {
        serde_json::to_string_pretty(debate).unwrap_or_else(|_| "{}".to_string())
    }

    /// Outcome and per-round counts only (concise output)
    pub fn format_summary(debate: &Debate) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n\n", "=== Debate Summary ===".cyan().bold()));
        output.push_str(&format!("{} {}\n", "Topic:".bold(), debate.topic()));
        output.push_str(&format!(
            "{} {}\n\n",
            "Participants:".dimmed(),
            debate
                .participants()
                .iter()
                .map(|p| format!("{} ({})", p.name, p.position))
                .collect::<Vec<_>>()
                .join(", ")
        ));

        for round in debate.rounds() {
            output.push_str(&format!(
                "  Round {}: {} responses, {} missed, {} failed{}\n",
                round.number,
                round.responses.len(),
                round.missed().len(),
                round.failed().len(),
                if round.timed_out { " (timed out)" } else { "" }
            ));
        }
        output.push('\n');
        output.push_str(&Self::outcome(debate));

        output
    }

    fn outcome(debate: &Debate) -> String {
        let mut output = format!(
            "{} {} after {} of {} rounds, {} responses\n",
            "Status:".bold(),
            debate.status(),
            debate.current_round(),
            debate.config().max_rounds,
            debate.response_count()
        );
        if let Some(reason) = debate.completion_reason() {
            output.push_str(&format!("{} {}\n", "Reason:".bold(), reason));
        }
        if let Some(error) = debate.error() {
            output.push_str(&format!("{} {}\n", "Error:".red().bold(), error));
        }
        output
    }

    fn describe(participant: &Participant) -> String {
        let mut line = format!("{} ({})", participant.name, participant.position);
        if let Some(model) = &participant.model {
            line.push_str(&format!(" - {}", model));
        }
        if let Some(flow) = &participant.flow {
            line.push_str(&format!(" via {}", flow.flow_type));
        }
        if !participant.active {
            line.push_str(" [inactive]");
        }
        line
    }

    fn round_title(round: &Round) -> String {
        if round.timed_out {
            format!("Round {} (timed out)", round.number)
        } else {
            format!("Round {}", round.number)
        }
    }

    fn name_of(debate: &Debate, id: ParticipantId) -> String {
        debate
            .participant(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
