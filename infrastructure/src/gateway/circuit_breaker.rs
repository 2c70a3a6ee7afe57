//! Per-provider circuit breaker.
//!
//! The breaker keeps the outcomes of the last `window_size` calls for each
//! provider id. Once `minimum_calls` outcomes are present and the failure
//! rate reaches the threshold, the circuit *opens* and calls fail fast.
//! After `open_wait` exactly one trial call is let through (*half-open*):
//! its success closes the circuit, its failure opens it again.

use super::health::HealthRegistry;
use super::settings::CircuitBreakerSettings;
use agora_application::ports::provider_call::{GatewayError, ProviderCallPort, ProviderRequest};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::{info, warn};

/// Circuit state for a single provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Healthy, calls allowed
    Closed,
    /// Tripped, calls rejected until the open wait has passed
    Open,
    /// Open wait passed, one trial call allowed
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    /// `true` = failure
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
    forced_open: bool,
}

impl Circuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            window: VecDeque::new(),
            opened_at: None,
            trial_in_flight: false,
            forced_open: false,
        }
    }

    fn open(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.trial_in_flight = false;
        self.window.clear();
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.opened_at = None;
        self.trial_in_flight = false;
        self.window.clear();
    }
}

/// How a call was admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Normal,
    Trial,
}

/// Circuit state for every provider id
#[derive(Debug)]
pub struct CircuitBreaker {
    settings: CircuitBreakerSettings,
    circuits: Mutex<HashMap<String, Circuit>>,
}

impl CircuitBreaker {
    pub fn new(settings: CircuitBreakerSettings) -> Self {
        Self {
            settings,
            circuits: Mutex::new(HashMap::new()),
        }
    }

    fn circuits(&self) -> MutexGuard<'_, HashMap<String, Circuit>> {
        self.circuits.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state of the circuit for `provider`
    pub fn state(&self, provider: &str) -> CircuitState {
        let circuits = self.circuits();
        match circuits.get(provider) {
            Some(circuit) if circuit.forced_open => CircuitState::Open,
            Some(circuit) => circuit.state,
            None => CircuitState::Closed,
        }
    }

    /// Decide whether a call to `provider` may proceed
    pub fn admit(&self, provider: &str) -> Result<Admission, GatewayError> {
        let now = Instant::now();
        let open_wait = self.settings.open_wait();
        let mut circuits = self.circuits();
        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::new);

        if circuit.forced_open {
            return Err(GatewayError::CircuitOpen(provider.to_string()));
        }
        match circuit.state {
            CircuitState::Closed => Ok(Admission::Normal),
            CircuitState::Open => {
                let waited = circuit
                    .opened_at
                    .is_none_or(|opened| now.duration_since(opened) >= open_wait);
                if !waited {
                    return Err(GatewayError::CircuitOpen(provider.to_string()));
                }
                circuit.state = CircuitState::HalfOpen;
                circuit.trial_in_flight = true;
                info!(provider, "Circuit half-open, admitting trial call");
                Ok(Admission::Trial)
            }
            CircuitState::HalfOpen => {
                if circuit.trial_in_flight {
                    return Err(GatewayError::CircuitOpen(provider.to_string()));
                }
                circuit.trial_in_flight = true;
                Ok(Admission::Trial)
            }
        }
    }

    /// Record the outcome of an admitted call
    pub fn record(&self, provider: &str, admission: Admission, failed: bool) {
        let now = Instant::now();
        let mut circuits = self.circuits();
        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::new);

        match admission {
            Admission::Trial => {
                if circuit.state != CircuitState::HalfOpen {
                    return;
                }
                if failed {
                    warn!(provider, "Trial call failed, circuit re-opened");
                    circuit.open(now);
                } else {
                    info!(provider, "Trial call succeeded, circuit closed");
                    circuit.close();
                }
            }
            Admission::Normal => {
                if circuit.state != CircuitState::Closed {
                    return;
                }
                circuit.window.push_back(failed);
                while circuit.window.len() > self.settings.window_size {
                    circuit.window.pop_front();
                }
                if circuit.window.len() < self.settings.minimum_calls {
                    return;
                }
                let failures = circuit.window.iter().filter(|f| **f).count();
                let rate = failures as f64 / circuit.window.len() as f64;
                if rate >= self.settings.failure_rate_threshold {
                    warn!(
                        provider,
                        failure_rate = rate,
                        window = circuit.window.len(),
                        "Circuit opened"
                    );
                    circuit.open(now);
                }
            }
        }
    }

    /// A trial call was dropped before it finished; treat it as failed
    fn abandon_trial(&self, provider: &str) {
        self.record(provider, Admission::Trial, true);
    }

    /// Reject calls to `provider` until [`CircuitBreaker::reset`]
    pub fn force_open(&self, provider: &str) {
        let mut circuits = self.circuits();
        circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::new)
            .forced_open = true;
        warn!(provider, "Circuit forced open");
    }

    /// Clear the window, state and override of `provider`
    pub fn reset(&self, provider: &str) {
        self.circuits().remove(provider);
        info!(provider, "Circuit reset");
    }
}

/// Marks an admitted trial as failed if the call future is dropped early
struct TrialGuard<'a> {
    breaker: &'a CircuitBreaker,
    provider: &'a str,
    armed: bool,
}

impl Drop for TrialGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.breaker.abandon_trial(self.provider);
        }
    }
}

/// Gateway layer between rate limiting and retries
pub struct CircuitBreakingProvider {
    inner: Arc<dyn ProviderCallPort>,
    breaker: Arc<CircuitBreaker>,
    health: Arc<HealthRegistry>,
}

impl CircuitBreakingProvider {
    pub fn new(
        inner: Arc<dyn ProviderCallPort>,
        breaker: Arc<CircuitBreaker>,
        health: Arc<HealthRegistry>,
    ) -> Self {
        Self {
            inner,
            breaker,
            health,
        }
    }
}

#[async_trait]
impl ProviderCallPort for CircuitBreakingProvider {
    async fn call(&self, request: &ProviderRequest) -> Result<String, GatewayError> {
        let provider = request.provider.as_str();
        let admission = self.breaker.admit(provider)?;
        let mut guard = TrialGuard {
            breaker: &self.breaker,
            provider,
            armed: admission == Admission::Trial,
        };

        let result = self.inner.call(request).await;
        guard.armed = false;

        // Rejections of the request itself say nothing about the provider
        let failed = matches!(&result, Err(e) if e.is_unavailable());
        self.breaker.record(provider, admission, failed);
        match &result {
            Ok(_) => self.health.record_success(provider),
            Err(e) if failed => self.health.record_failure(provider, &e.to_string()),
            Err(_) => {}
        }
        result
    }
}
