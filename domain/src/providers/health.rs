//! Per-provider success/failure counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rolling call outcome counters for one provider id (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub provider: String,
    pub successes: u64,
    pub failures: u64,
    pub consecutive_failures: u32,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl ProviderHealth {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            successes: 0,
            failures: 0,
            consecutive_failures: 0,
            last_success_at: None,
            last_failure_at: None,
            last_error: None,
        }
    }

    pub fn record_success(&mut self, now: DateTime<Utc>) {
        self.successes += 1;
        self.consecutive_failures = 0;
        self.last_success_at = Some(now);
    }

    pub fn record_failure(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.failures += 1;
        self.consecutive_failures += 1;
        self.last_failure_at = Some(now);
        self.last_error = Some(error.into());
    }

    pub fn total(&self) -> u64 {
        self.successes + self.failures
    }

    /// Successes / total × 100; 100 before any call
    pub fn health_percentage(&self) -> f64 {
        match self.total() {
            0 => 100.0,
            total => self.successes as f64 / total as f64 * 100.0,
        }
    }

    pub fn failure_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.failures as f64 / total as f64,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.provider));
    }
}
