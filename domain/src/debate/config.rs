//! Debate configuration (Value Object)

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rules a debate is played under.
///
/// Validated once at creation time; the aggregate never re-checks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateConfig {
    /// Minimum participants required to initialize
    pub min_participants: usize,
    /// Maximum participants that may join
    pub max_participants: usize,
    /// Number of rounds after which the debate ends
    pub max_rounds: u32,
    /// Per-round time budget in milliseconds (`None` = unlimited)
    pub round_time_limit_ms: Option<u64>,
    /// Require every position to be held by the same number of participants
    /// and alternate positions in turn order
    pub require_balanced_positions: bool,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            min_participants: 2,
            max_participants: 6,
            max_rounds: 3,
            round_time_limit_ms: None,
            require_balanced_positions: false,
        }
    }
}

impl DebateConfig {
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn with_participant_range(mut self, min: usize, max: usize) -> Self {
        self.min_participants = min;
        self.max_participants = max;
        self
    }

    pub fn with_round_time_limit(mut self, limit: Duration) -> Self {
        self.round_time_limit_ms = Some(limit.as_millis() as u64);
        self
    }

    pub fn with_balanced_positions(mut self, balanced: bool) -> Self {
        self.require_balanced_positions = balanced;
        self
    }

    /// Round time budget as a [`Duration`]
    pub fn round_time_limit(&self) -> Option<Duration> {
        self.round_time_limit_ms.map(Duration::from_millis)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.min_participants == 0 {
            return Err(DomainError::config("min_participants must be at least 1"));
        }
        if self.max_participants < self.min_participants {
            return Err(DomainError::config(format!(
                "max_participants ({}) is below min_participants ({})",
                self.max_participants, self.min_participants
            )));
        }
        if self.max_rounds == 0 {
            return Err(DomainError::config("max_rounds must be at least 1"));
        }
        if self.round_time_limit_ms == Some(0) {
            return Err(DomainError::config("round_time_limit cannot be 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DebateConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = DebateConfig::default()
            .with_max_rounds(5)
            .with_participant_range(2, 4)
            .with_round_time_limit(Duration::from_secs(30))
            .with_balanced_positions(true);

        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.max_participants, 4);
        assert_eq!(config.round_time_limit(), Some(Duration::from_secs(30)));
        assert!(config.require_balanced_positions);
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(
            DebateConfig::default()
                .with_participant_range(3, 2)
                .validate()
                .is_err()
        );
        assert!(DebateConfig::default().with_max_rounds(0).validate().is_err());
        assert!(
            DebateConfig::default()
                .with_participant_range(0, 2)
                .validate()
                .is_err()
        );
    }
}
