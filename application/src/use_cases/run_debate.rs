//! Run Debate use case
//!
//! Drives a debate to completion: every round, all AI participants take
//! their turn in parallel; the round then closes either through the last
//! submission or, when someone did not answer, once the round deadline and
//! its grace period have passed.

use crate::ports::progress::{DebateProgressNotifier, NoProgress};
use crate::use_cases::debate_service::{DebateService, DebateServiceError, TurnInput};
use agora_domain::{Debate, DebateId, DebateStatus, ParticipantId, RoundClosure, SubmitOutcome};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors that can occur while driving a debate
#[derive(Error, Debug)]
pub enum RunDebateError {
    #[error(transparent)]
    Service(#[from] DebateServiceError),

    #[error("Debate cannot be driven from status {0}")]
    NotRunnable(DebateStatus),

    #[error("Round {0} did not close")]
    RoundStuck(u32),
}

/// Use case for running an automated debate
pub struct RunDebateUseCase {
    service: Arc<DebateService>,
}

impl RunDebateUseCase {
    pub fn new(service: Arc<DebateService>) -> Self {
        Self { service }
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, debate_id: DebateId) -> Result<Debate, RunDebateError> {
        self.execute_with_progress(debate_id, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        debate_id: DebateId,
        progress: &dyn DebateProgressNotifier,
    ) -> Result<Debate, RunDebateError> {
        let debate = self.service.get_debate(debate_id).await?;
        match debate.status() {
            DebateStatus::Created => {
                self.service.initialize_debate(debate_id).await?;
                self.service.start_debate(debate_id).await?;
            }
            DebateStatus::Initialized => {
                self.service.start_debate(debate_id).await?;
            }
            DebateStatus::InProgress => {}
            status => return Err(RunDebateError::NotRunnable(status)),
        }

        info!(debate_id = %debate_id, "Running debate");
        loop {
            let debate = self.service.get_debate(debate_id).await?;
            if debate.status() != DebateStatus::InProgress {
                break;
            }
            let Some(round) = debate.open_round() else {
                break;
            };
            let number = round.number;
            let deadline = round.deadline(debate.config().round_time_limit());

            let closure = self.play_round(&debate, progress).await;
            let closure = match closure {
                Some(closure) => Some(closure),
                None => self.close_round(debate_id, number, deadline).await?,
            };
            match closure {
                Some(closure) => progress.on_round_complete(&closure),
                None => {
                    let current = self.service.get_debate(debate_id).await?;
                    if current.open_round().is_some_and(|r| r.number == number) {
                        return Err(RunDebateError::RoundStuck(number));
                    }
                    debug!(debate_id = %debate_id, round = number, "Round closed elsewhere");
                }
            }
        }

        let debate = self.service.get_debate(debate_id).await?;
        info!(
            debate_id = %debate_id,
            status = %debate.status(),
            rounds = debate.current_round(),
            responses = debate.response_count(),
            "Debate run finished"
        );
        progress.on_debate_complete(&debate);
        Ok(debate)
    }

    /// Run all outstanding AI turns of the open round in parallel.
    ///
    /// Returns the closure when one of the turns closed the round.
    async fn play_round(
        &self,
        debate: &Debate,
        progress: &dyn DebateProgressNotifier,
    ) -> Option<RoundClosure> {
        let round = debate.open_round()?;
        let number = round.number;
        let turns: Vec<(ParticipantId, String)> = round
            .awaiting()
            .into_iter()
            .filter_map(|id| debate.participant(id))
            .filter(|p| p.is_ai())
            .map(|p| (p.id, p.name.clone()))
            .collect();

        info!(debate_id = %debate.id(), round = number, turns = turns.len(), "Round started");
        progress.on_round_start(number, debate.config().max_rounds, turns.len());

        let mut join_set = JoinSet::new();
        let attempts = self.service.params().max_turn_attempts;
        for (participant_id, name) in turns {
            let service = Arc::clone(&self.service);
            let debate_id = debate.id();
            join_set.spawn(async move {
                let result = Self::take_turn(&service, debate_id, participant_id, attempts).await;
                (name, result)
            });
        }

        let mut closure = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(outcome))) => {
                    debug!(participant = %name, round = number, "Turn complete");
                    progress.on_turn_complete(number, &name, true);
                    if outcome.closure.is_some() {
                        closure = outcome.closure;
                    }
                }
                Ok((name, Err(e))) => {
                    warn!(participant = %name, round = number, error = %e, "Turn failed");
                    progress.on_turn_complete(number, &name, false);
                }
                Err(e) => {
                    warn!("Turn task join error: {}", e);
                }
            }
        }
        closure
    }

    /// One participant's turn, retried while the failure is retryable
    async fn take_turn(
        service: &DebateService,
        debate_id: DebateId,
        participant_id: ParticipantId,
        attempts: u32,
    ) -> Result<SubmitOutcome, DebateServiceError> {
        let mut attempt = 1;
        loop {
            match service
                .submit_response(debate_id, participant_id, TurnInput::generate())
                .await
            {
                Err(e) if e.is_retryable() && attempt < attempts => {
                    debug!(
                        participant_id = %participant_id,
                        attempt,
                        error = %e,
                        "Retrying turn"
                    );
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Close a round that still waits for someone: once its deadline and
    /// grace period have passed when it has one, otherwise right away (the
    /// missing turns are marked missed).
    async fn close_round(
        &self,
        debate_id: DebateId,
        number: u32,
        deadline: Option<chrono::DateTime<Utc>>,
    ) -> Result<Option<RoundClosure>, RunDebateError> {
        if let Some(deadline) = deadline {
            let wait = (deadline - Utc::now()).to_std().unwrap_or_default()
                + self.service.params().round_grace;
            debug!(debate_id = %debate_id, round = number, ?wait, "Waiting for round deadline");
            tokio::time::sleep(wait).await;
        }
        Ok(self.service.expire_round(debate_id, number).await?)
    }
}
