//! Debate defaults from TOML (`[debate]` section)

use agora_domain::{DebateConfig, Model};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw debate configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDebateConfig {
    pub max_rounds: u32,
    pub min_participants: usize,
    pub max_participants: usize,
    /// Per-round time budget (unset = unlimited)
    pub round_time_limit_seconds: Option<u64>,
    pub balanced_positions: bool,
    /// Model for AI participants and flows that do not name one
    pub default_model: Model,
    /// Attempts per automated turn while the failure is retryable
    pub max_turn_attempts: u32,
}

impl Default for FileDebateConfig {
    fn default() -> Self {
        let defaults = DebateConfig::default();
        Self {
            max_rounds: defaults.max_rounds,
            min_participants: defaults.min_participants,
            max_participants: defaults.max_participants,
            round_time_limit_seconds: None,
            balanced_positions: defaults.require_balanced_positions,
            default_model: Model::default(),
            max_turn_attempts: 2,
        }
    }
}

impl FileDebateConfig {
    /// Convert to the domain configuration (validated by the domain on use)
    pub fn to_debate_config(&self) -> DebateConfig {
        let config = DebateConfig::default()
            .with_max_rounds(self.max_rounds)
            .with_participant_range(self.min_participants, self.max_participants)
            .with_balanced_positions(self.balanced_positions);
        match self.round_time_limit_seconds {
            Some(seconds) => config.with_round_time_limit(Duration::from_secs(seconds)),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_domain() {
        assert_eq!(
            FileDebateConfig::default().to_debate_config(),
            DebateConfig::default()
        );
    }

    #[test]
    fn test_round_time_limit_in_seconds() {
        let config: FileDebateConfig = toml::from_str(
            r#"
max_rounds = 5
round_time_limit_seconds = 30
default_model = "gpt-5.2"
"#,
        )
        .unwrap();
        let debate = config.to_debate_config();
        assert_eq!(debate.max_rounds, 5);
        assert_eq!(debate.round_time_limit(), Some(Duration::from_secs(30)));
        assert_eq!(config.default_model, Model::Gpt52);
    }
}
