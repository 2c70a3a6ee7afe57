use agora_application::ports::event_publisher::{DebateNotification, EventPublisherPort};
use tracing::{info, warn};

/// Mirrors debate notifications into the `tracing` log
#[derive(Debug, Default)]
pub struct TracingEventPublisher;

impl TracingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

impl EventPublisherPort for TracingEventPublisher {
    fn publish(&self, event: &DebateNotification) {
        let debate_id = event.debate_id();
        match event {
            DebateNotification::DebateStarted {
                topic,
                participants,
                max_rounds,
                ..
            } => info!(%debate_id, %topic, participants, max_rounds, "Debate started"),
            DebateNotification::RoundStarted {
                round, turn_order, ..
            } => info!(%debate_id, round, turns = turn_order.len(), "Round started"),
            DebateNotification::ResponseSubmitted {
                round,
                participant_id,
                response_time_ms,
                flagged,
                ..
            } => info!(
                %debate_id,
                round,
                participant = %participant_id,
                response_time_ms,
                flagged,
                "Response submitted"
            ),
            DebateNotification::TurnFailed {
                round,
                participant_id,
                reason,
                retryable,
                ..
            } => warn!(
                %debate_id,
                round,
                participant = %participant_id,
                retryable,
                "Turn failed: {}",
                reason
            ),
            DebateNotification::RoundCompleted {
                round,
                responses,
                missed,
                failed,
                timed_out,
                ..
            } => info!(
                %debate_id,
                round,
                responses,
                missed = missed.len(),
                failed = failed.len(),
                timed_out,
                "Round completed"
            ),
            DebateNotification::DebateCompleted {
                rounds,
                responses,
                reason,
                ..
            } => info!(%debate_id, rounds, responses, %reason, "Debate completed"),
            DebateNotification::DebateArchived { .. } => info!(%debate_id, "Debate archived"),
            DebateNotification::DebateFailed { reason, .. } => {
                warn!(%debate_id, "Debate failed: {}", reason)
            }
        }
    }
}
