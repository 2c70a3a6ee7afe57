//! Gateway middleware settings (`[gateway.*]` config sections)

use agora_application::ports::provider_call::GatewayErrorKind;
use agora_domain::ModelFamily;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token bucket per `(provider, organization)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Bucket size (burst)
    pub capacity: u32,
    /// Tokens added per second
    pub refill_per_second: f64,
    /// Longest a caller waits for a token before `RateLimited`
    pub max_wait_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            capacity: 10,
            refill_per_second: 5.0,
            max_wait_ms: 2_000,
        }
    }
}

impl RateLimitSettings {
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

/// Count-based sliding-window circuit breaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Outcomes kept in the window
    pub window_size: usize,
    /// Outcomes needed before the failure rate is evaluated
    pub minimum_calls: usize,
    /// Failure rate (0.0..=1.0) at which the circuit opens
    pub failure_rate_threshold: f64,
    /// Time spent open before a half-open trial is admitted
    pub open_wait_ms: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            window_size: 20,
            minimum_calls: 5,
            failure_rate_threshold: 0.5,
            open_wait_ms: 30_000,
        }
    }
}

impl CircuitBreakerSettings {
    pub fn open_wait(&self) -> Duration {
        Duration::from_millis(self.open_wait_ms)
    }
}

/// Bounded retries with exponential backoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub multiplier: f64,
    pub max_backoff_ms: u64,
    /// Random spread applied to each backoff, as a fraction (0.0..=1.0)
    pub jitter: f64,
    /// Error kinds that are retried (empty = every kind not in `abort_on`)
    pub retry_on: Vec<GatewayErrorKind>,
    /// Error kinds that are never retried
    pub abort_on: Vec<GatewayErrorKind>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            multiplier: 2.0,
            max_backoff_ms: 5_000,
            jitter: 0.2,
            retry_on: vec![
                GatewayErrorKind::Timeout,
                GatewayErrorKind::Connection,
                GatewayErrorKind::RequestFailed,
                GatewayErrorKind::RateLimited,
            ],
            abort_on: vec![
                GatewayErrorKind::InvalidRequest,
                GatewayErrorKind::UnknownProvider,
                GatewayErrorKind::ProviderDisabled,
                GatewayErrorKind::CircuitOpen,
            ],
        }
    }
}

impl RetrySettings {
    /// Whether an error of this kind is worth another attempt
    pub fn should_retry(&self, kind: GatewayErrorKind) -> bool {
        if self.abort_on.contains(&kind) {
            return false;
        }
        self.retry_on.is_empty() || self.retry_on.contains(&kind)
    }

    /// Backoff before attempt `attempt + 1` (first retry is `attempt == 1`),
    /// before jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_backoff_ms as f64 * self.multiplier.powi(exponent);
        Duration::from_millis(millis.min(self.max_backoff_ms as f64) as u64)
    }
}

/// Response cache with a TTL per model family (0 disables the family)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub claude_ttl_seconds: u64,
    pub gpt_ttl_seconds: u64,
    pub gemini_ttl_seconds: u64,
    pub other_ttl_seconds: u64,
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            claude_ttl_seconds: 300,
            gpt_ttl_seconds: 300,
            gemini_ttl_seconds: 300,
            other_ttl_seconds: 0,
            max_entries: 1_000,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self, family: ModelFamily) -> Duration {
        let seconds = match family {
            ModelFamily::Claude => self.claude_ttl_seconds,
            ModelFamily::Gpt => self.gpt_ttl_seconds,
            ModelFamily::Gemini => self.gemini_ttl_seconds,
            ModelFamily::Other => self.other_ttl_seconds,
        };
        Duration::from_secs(seconds)
    }
}

/// All `[gateway]` settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub rate_limit: RateLimitSettings,
    pub circuit_breaker: CircuitBreakerSettings,
    pub retry: RetrySettings,
    pub cache: CacheSettings,
    /// Upper bound for a single provider attempt
    pub timeout_seconds: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitSettings::default(),
            circuit_breaker: CircuitBreakerSettings::default(),
            retry: RetrySettings::default(),
            cache: CacheSettings::default(),
            timeout_seconds: 120,
        }
    }
}

impl GatewaySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
