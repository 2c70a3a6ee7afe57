//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod debate;
mod flows;
mod output;
mod providers;

pub use debate::FileDebateConfig;
pub use flows::FileFlowsConfig;
pub use output::{FileLoggingConfig, FileOutputConfig, FileOutputFormat};
pub use providers::{FileProvidersConfig, FileScriptedConfig};

use crate::gateway::GatewaySettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigValidationError {
    #[error("{field} cannot be 0")]
    Zero { field: &'static str },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("debate.max_participants ({max}) is below debate.min_participants ({min})")]
    ParticipantRange { min: usize, max: usize },

    #[error("provider name cannot be empty ({0})")]
    EmptyProviderName(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Defaults for new debates
    pub debate: FileDebateConfig,
    /// Provider gateway middleware
    pub gateway: GatewaySettings,
    /// Provider routing
    pub providers: FileProvidersConfig,
    /// Agentic flow defaults
    pub flows: FileFlowsConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Transcript and diagnostic log files
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        let mut non_zero = |field: &'static str, value: u64| {
            if value == 0 {
                issues.push(ConfigValidationError::Zero { field });
            }
        };

        // 1. Debate
        non_zero("debate.max_rounds", self.debate.max_rounds as u64);
        non_zero("debate.min_participants", self.debate.min_participants as u64);
        non_zero("debate.max_turn_attempts", self.debate.max_turn_attempts as u64);
        if let Some(seconds) = self.debate.round_time_limit_seconds {
            non_zero("debate.round_time_limit_seconds", seconds);
        }

        // 2. Gateway
        let gateway = &self.gateway;
        non_zero("gateway.rate_limit.capacity", gateway.rate_limit.capacity as u64);
        non_zero("gateway.circuit_breaker.window_size", gateway.circuit_breaker.window_size as u64);
        non_zero("gateway.retry.max_attempts", gateway.retry.max_attempts as u64);
        non_zero("gateway.timeout_seconds", gateway.timeout_seconds);

        // 3. Flows
        non_zero("flows.max_calls", self.flows.max_calls as u64);

        if self.debate.max_participants < self.debate.min_participants {
            issues.push(ConfigValidationError::ParticipantRange {
                min: self.debate.min_participants,
                max: self.debate.max_participants,
            });
        }

        let mut in_range = |field: &'static str, value: f64, min: f64, max: f64| {
            if !(min..=max).contains(&value) {
                issues.push(ConfigValidationError::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                });
            }
        };
        in_range(
            "gateway.circuit_breaker.failure_rate_threshold",
            gateway.circuit_breaker.failure_rate_threshold,
            0.0,
            1.0,
        );
        in_range("gateway.retry.jitter", gateway.retry.jitter, 0.0, 1.0);
        in_range("gateway.retry.multiplier", gateway.retry.multiplier, 1.0, 10.0);
        in_range(
            "gateway.rate_limit.refill_per_second",
            gateway.rate_limit.refill_per_second,
            f64::MIN_POSITIVE,
            f64::MAX,
        );
        in_range(
            "providers.scripted.confidence",
            self.providers.scripted.confidence,
            0.0,
            1.0,
        );

        // 4. Provider names
        if self.providers.default.as_deref().is_some_and(|p| p.trim().is_empty()) {
            issues.push(ConfigValidationError::EmptyProviderName(
                "providers.default".to_string(),
            ));
        }
        let mut routed: Vec<&String> = self
            .providers
            .routing
            .iter()
            .filter(|(model, provider)| model.trim().is_empty() || provider.trim().is_empty())
            .map(|(model, _)| model)
            .collect();
        routed.sort();
        for model in routed {
            issues.push(ConfigValidationError::EmptyProviderName(format!(
                "providers.routing.\"{}\"",
                model
            )));
        }

        issues
    }
}
