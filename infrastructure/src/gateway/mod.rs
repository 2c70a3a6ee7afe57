//! Resilient provider gateway.
//!
//! Every layer implements [`ProviderCallPort`] and wraps the next one. The
//! chain is composed once by [`ProviderGateway::new`]:
//!
//! ```text
//! RateLimited ─▶ CircuitBreaking ─▶ Retrying ─▶ Cached ─▶ provider router
//! ```
//!
//! Breaker and health state are process-wide and keyed by provider id, so
//! one gateway instance is shared by every debate.

pub mod cache;
pub mod circuit_breaker;
pub mod health;
pub mod rate_limiter;
pub mod retry;
pub mod settings;

pub use cache::CachedProvider;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakingProvider, CircuitState};
pub use health::HealthRegistry;
pub use rate_limiter::{RateLimitedProvider, RateLimiter};
pub use retry::RetryingProvider;
pub use settings::{
    CacheSettings, CircuitBreakerSettings, GatewaySettings, RateLimitSettings, RetrySettings,
};

use agora_application::ports::provider_call::{
    GatewayError, ProviderAdminPort, ProviderCallPort, ProviderRequest, StreamHandle,
};
use agora_domain::ProviderHealth;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// The composed middleware chain plus its operator surface
pub struct ProviderGateway {
    chain: Arc<dyn ProviderCallPort>,
    breaker: Arc<CircuitBreaker>,
    health: Arc<HealthRegistry>,
}

impl ProviderGateway {
    /// Wrap `provider` (usually a [`ProviderRouter`](crate::providers::ProviderRouter))
    /// in the full middleware chain
    pub fn new(provider: Arc<dyn ProviderCallPort>, settings: &GatewaySettings) -> Self {
        let breaker = Arc::new(CircuitBreaker::new(settings.circuit_breaker.clone()));
        let health = Arc::new(HealthRegistry::new());

        let cached: Arc<dyn ProviderCallPort> =
            Arc::new(CachedProvider::new(provider, settings.cache.clone()));
        let retrying: Arc<dyn ProviderCallPort> = Arc::new(RetryingProvider::new(
            cached,
            settings.retry.clone(),
            settings.timeout(),
        ));
        let breaking: Arc<dyn ProviderCallPort> = Arc::new(CircuitBreakingProvider::new(
            retrying,
            breaker.clone(),
            health.clone(),
        ));
        let chain: Arc<dyn ProviderCallPort> = Arc::new(RateLimitedProvider::new(
            breaking,
            settings.rate_limit.clone(),
        ));

        debug!(?settings, "Provider gateway composed");
        Self {
            chain,
            breaker,
            health,
        }
    }

    pub fn circuit_state(&self, provider: &str) -> CircuitState {
        self.breaker.state(provider)
    }

    fn ensure_enabled(&self, provider: &str) -> Result<(), GatewayError> {
        if self.health.is_disabled(provider) {
            return Err(GatewayError::ProviderDisabled(provider.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderCallPort for ProviderGateway {
    async fn call(&self, request: &ProviderRequest) -> Result<String, GatewayError> {
        self.ensure_enabled(&request.provider)?;
        self.chain.call(request).await
    }

    async fn call_streaming(
        &self,
        request: &ProviderRequest,
    ) -> Result<StreamHandle, GatewayError> {
        self.ensure_enabled(&request.provider)?;
        self.chain.call_streaming(request).await
    }
}

impl ProviderAdminPort for ProviderGateway {
    fn health(&self, provider: &str) -> ProviderHealth {
        self.health.get(provider)
    }

    fn health_report(&self) -> Vec<ProviderHealth> {
        self.health.report()
    }

    fn force_open(&self, provider: &str) {
        self.breaker.force_open(provider);
    }

    fn disable(&self, provider: &str) {
        self.health.disable(provider);
        info!(provider, "Provider disabled");
    }

    fn reset(&self, provider: &str) {
        self.breaker.reset(provider);
        self.health.reset(provider);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_domain::Model;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    struct Backend {
        failing: AtomicBool,
        calls: AtomicUsize,
    }

    impl Backend {
        fn new(failing: bool) -> Arc<Self> {
            Arc::new(Self {
                failing: AtomicBool::new(failing),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProviderCallPort for Backend {
        async fn call(&self, request: &ProviderRequest) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(GatewayError::ConnectionError("refused".into()));
            }
            Ok(format!("answer to {}", request.prompt))
        }
    }

    fn settings() -> GatewaySettings {
        GatewaySettings {
            circuit_breaker: CircuitBreakerSettings {
                window_size: 4,
                minimum_calls: 2,
                failure_rate_threshold: 0.5,
                open_wait_ms: 10_000,
            },
            retry: RetrySettings {
                max_attempts: 2,
                initial_backoff_ms: 10,
                jitter: 0.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn request(prompt: &str) -> ProviderRequest {
        ProviderRequest::new("anthropic", Model::ClaudeSonnet45, prompt)
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_prompt_served_from_cache() {
        let backend = Backend::new(false);
        let gateway = ProviderGateway::new(backend.clone(), &settings());

        let first = gateway.call(&request("why?")).await.unwrap();
        let second = gateway.call(&request("why?")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.calls(), 1);
        assert_eq!(gateway.health("anthropic").successes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_opens_circuit() {
        let backend = Backend::new(true);
        let gateway = ProviderGateway::new(backend.clone(), &settings());

        // Each gateway call makes two attempts and counts as one breaker outcome
        assert!(gateway.call(&request("a")).await.is_err());
        assert!(gateway.call(&request("b")).await.is_err());
        assert_eq!(backend.calls(), 4);
        assert_eq!(gateway.circuit_state("anthropic"), CircuitState::Open);

        let err = gateway.call(&request("c")).await.unwrap_err();
        assert_eq!(err, GatewayError::CircuitOpen("anthropic".into()));
        assert_eq!(backend.calls(), 4);
        assert_eq!(gateway.health("anthropic").failures, 2);

        backend.failing.store(false, Ordering::SeqCst);
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(gateway.call(&request("d")).await.is_ok());
        assert_eq!(gateway.circuit_state("anthropic"), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_operator_overrides() {
        let backend = Backend::new(false);
        let gateway = ProviderGateway::new(backend.clone(), &settings());

        gateway.disable("anthropic");
        assert_eq!(
            gateway.call(&request("a")).await.unwrap_err(),
            GatewayError::ProviderDisabled("anthropic".into())
        );

        gateway.reset("anthropic");
        gateway.force_open("anthropic");
        assert_eq!(
            gateway.call(&request("a")).await.unwrap_err(),
            GatewayError::CircuitOpen("anthropic".into())
        );
        assert_eq!(backend.calls(), 0);

        gateway.reset("anthropic");
        assert!(gateway.call(&request("a")).await.is_ok());
        assert_eq!(gateway.health_report().len(), 1);
        assert_eq!(gateway.health("anthropic").health_percentage(), 100.0);
    }
}
