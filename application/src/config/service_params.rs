//! Service parameters for the debate service and runner control.
//!
//! [`ServiceParams`] groups the static knobs of
//! [`DebateService`](crate::use_cases::debate_service::DebateService) and
//! [`RunDebateUseCase`](crate::use_cases::run_debate::RunDebateUseCase).
//! These are application-layer concerns, not domain policy.

use agora_domain::Model;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Debate service control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceParams {
    /// Extra time granted to in-flight turns after the round budget runs out,
    /// before the round timer force-completes the round.
    pub round_grace: Duration,
    /// Model used for flow executions that are not bound to a participant.
    pub default_model: Model,
    /// Attempts per automated turn while the failure is retryable.
    pub max_turn_attempts: u32,
    /// Upper bound for one flow execution when the round has no time limit.
    pub flow_timeout: Option<Duration>,
    /// Organization provider calls are billed to (rate-limit key)
    pub organization: Option<String>,
}

impl Default for ServiceParams {
    fn default() -> Self {
        Self {
            round_grace: Duration::from_secs(2),
            default_model: Model::default(),
            max_turn_attempts: 2,
            flow_timeout: Some(Duration::from_secs(300)),
            organization: None,
        }
    }
}

impl ServiceParams {
    // ==================== Builder Methods ====================

    pub fn with_round_grace(mut self, grace: Duration) -> Self {
        self.round_grace = grace;
        self
    }

    pub fn with_default_model(mut self, model: Model) -> Self {
        self.default_model = model;
        self
    }

    pub fn with_max_turn_attempts(mut self, attempts: u32) -> Self {
        self.max_turn_attempts = attempts.max(1);
        self
    }

    pub fn with_flow_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.flow_timeout = timeout;
        self
    }

    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ServiceParams::default();
        assert_eq!(params.round_grace, Duration::from_secs(2));
        assert_eq!(params.max_turn_attempts, 2);
    }

    #[test]
    fn test_attempts_never_zero() {
        let params = ServiceParams::default().with_max_turn_attempts(0);
        assert_eq!(params.max_turn_attempts, 1);
    }
}
