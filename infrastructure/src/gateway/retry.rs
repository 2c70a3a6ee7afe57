//! Bounded retries with exponential backoff and jitter

use super::settings::RetrySettings;
use agora_application::ports::provider_call::{GatewayError, ProviderCallPort, ProviderRequest};
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Gateway layer between the circuit breaker and the cache.
///
/// Every attempt is bounded by the request timeout (or the gateway default
/// when the request has none); a timed-out attempt counts as a `Timeout`.
pub struct RetryingProvider {
    inner: Arc<dyn ProviderCallPort>,
    settings: RetrySettings,
    attempt_timeout: Duration,
}

impl RetryingProvider {
    pub fn new(
        inner: Arc<dyn ProviderCallPort>,
        settings: RetrySettings,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            inner,
            settings,
            attempt_timeout,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let base = self.settings.backoff(attempt);
        let jitter = self.settings.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 || base.is_zero() {
            return base;
        }
        let factor = rand::rng().random_range(1.0 - jitter..=1.0 + jitter);
        base.mul_f64(factor)
    }

    async fn attempt(&self, request: &ProviderRequest) -> Result<String, GatewayError> {
        let limit = request
            .timeout
            .map_or(self.attempt_timeout, |t| t.min(self.attempt_timeout));
        tokio::time::timeout(limit, self.inner.call(request))
            .await
            .unwrap_or(Err(GatewayError::Timeout(limit)))
    }
}

#[async_trait]
impl ProviderCallPort for RetryingProvider {
    async fn call(&self, request: &ProviderRequest) -> Result<String, GatewayError> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.attempt(request).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < max_attempts && self.settings.should_retry(e.kind()) => {
                    let delay = self.delay(attempt);
                    debug!(
                        provider = %request.provider,
                        attempt,
                        max_attempts,
                        ?delay,
                        error = %e,
                        "Retrying provider call"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if attempt > 1 {
                        warn!(
                            provider = %request.provider,
                            attempts = attempt,
                            error = %e,
                            "Provider call failed after retries"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_domain::Model;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies with the scripted results in order, then "done"
    struct Scripted {
        results: Mutex<Vec<Result<String, GatewayError>>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl Scripted {
        fn new(mut results: Vec<Result<String, GatewayError>>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl ProviderCallPort for Scripted {
        async fn call(&self, _request: &ProviderRequest) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Ok("done".to_string()))
        }
    }

    fn settings(max_attempts: u32) -> RetrySettings {
        RetrySettings {
            max_attempts,
            initial_backoff_ms: 100,
            jitter: 0.0,
            ..Default::default()
        }
    }

    fn request() -> ProviderRequest {
        ProviderRequest::new("openai", Model::Gpt52, "hi")
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors() {
        let inner = Arc::new(Scripted::new(vec![
            Err(GatewayError::ConnectionError("reset".into())),
            Err(GatewayError::RequestFailed("503".into())),
        ]));
        let retrying = RetryingProvider::new(inner.clone(), settings(3), Duration::from_secs(10));

        let started = tokio::time::Instant::now();
        assert_eq!(retrying.call(&request()).await.unwrap(), "done");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
        // 100ms then 200ms of backoff
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let inner = Arc::new(Scripted::new(vec![
            Err(GatewayError::ConnectionError("a".into())),
            Err(GatewayError::ConnectionError("b".into())),
        ]));
        let retrying = RetryingProvider::new(inner.clone(), settings(2), Duration::from_secs(10));

        assert_eq!(
            retrying.call(&request()).await.unwrap_err(),
            GatewayError::ConnectionError("b".into())
        );
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_list_is_not_retried() {
        let inner = Arc::new(Scripted::new(vec![Err(GatewayError::InvalidRequest(
            "empty prompt".into(),
        ))]));
        let retrying = RetryingProvider::new(inner.clone(), settings(5), Duration::from_secs(10));

        assert!(retrying.call(&request()).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempt_times_out_and_is_retried() {
        let mut scripted = Scripted::new(vec![]);
        scripted.delay = Some(Duration::from_secs(5));
        let inner = Arc::new(scripted);
        let retrying = RetryingProvider::new(inner.clone(), settings(2), Duration::from_secs(60));

        let err = retrying
            .call(&request().with_timeout(Some(Duration::from_secs(1))))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Timeout(Duration::from_secs(1)));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let retrying = RetryingProvider::new(
            Arc::new(Scripted::new(vec![])),
            RetrySettings {
                initial_backoff_ms: 1_000,
                jitter: 0.5,
                ..Default::default()
            },
            Duration::from_secs(1),
        );
        for _ in 0..50 {
            let delay = retrying.delay(1);
            assert!(delay >= Duration::from_millis(500) && delay <= Duration::from_millis(1_500));
        }
    }
}
