//! Round timer
//!
//! Armed when a round opens with a time budget. After `limit + grace` it
//! asks the service to force-complete that round; completion is idempotent,
//! so a timer firing after the round already closed is a no-op.

use crate::use_cases::debate_service::DebateService;
use agora_domain::DebateId;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct RoundTimer;

impl RoundTimer {
    /// Spawn the timer for round `round` of `debate_id`.
    ///
    /// Holds only a weak reference, so a dropped service stops its timers.
    pub fn arm(
        service: Weak<DebateService>,
        debate_id: DebateId,
        round: u32,
        delay: Duration,
        cancellation: CancellationToken,
    ) -> JoinHandle<()> {
        debug!(debate_id = %debate_id, round, ?delay, "Round timer armed");
        tokio::spawn(async move {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    debug!(debate_id = %debate_id, round, "Round timer cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    let Some(service) = service.upgrade() else {
                        return;
                    };
                    match service.expire_round(debate_id, round).await {
                        Ok(Some(closure)) => debug!(
                            debate_id = %debate_id,
                            round,
                            missed = closure.missed.len(),
                            "Round closed by timer"
                        ),
                        Ok(None) => debug!(debate_id = %debate_id, round, "Round already closed"),
                        Err(e) => {
                            warn!(debate_id = %debate_id, round, error = %e, "Round timer failed")
                        }
                    }
                }
            }
        })
    }
}
