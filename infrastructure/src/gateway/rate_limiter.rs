//! Token-bucket rate limiting per `(provider, organization)`

use super::settings::RateLimitSettings;
use agora_application::ports::provider_call::{
    GatewayError, ProviderCallPort, ProviderRequest, StreamHandle,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

/// Token buckets keyed by provider id and organization
#[derive(Debug)]
pub struct RateLimiter {
    settings: RateLimitSettings,
    buckets: Mutex<HashMap<(String, Option<String>), Bucket>>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            settings,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve a token and return how long the caller must wait for it.
    ///
    /// A reservation may drive the bucket negative; later callers then wait
    /// behind it. Fails when the wait would exceed `max_wait`.
    pub fn reserve(
        &self,
        provider: &str,
        organization: Option<&str>,
    ) -> Result<Duration, GatewayError> {
        let now = Instant::now();
        let capacity = self.settings.capacity as f64;
        let rate = self.settings.refill_per_second;

        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let bucket = buckets
            .entry((provider.to_string(), organization.map(String::from)))
            .or_insert(Bucket {
                tokens: capacity,
                refilled_at: now,
            });

        let elapsed = now.duration_since(bucket.refilled_at).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * rate).min(capacity);
        bucket.refilled_at = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return Ok(Duration::ZERO);
        }

        let wait = if rate > 0.0 {
            Duration::try_from_secs_f64((1.0 - bucket.tokens) / rate).unwrap_or(Duration::MAX)
        } else {
            Duration::MAX
        };
        if wait > self.settings.max_wait() {
            return Err(GatewayError::RateLimited {
                provider: provider.to_string(),
                retry_after_ms: wait.as_millis().min(u64::MAX as u128) as u64,
            });
        }
        bucket.tokens -= 1.0;
        Ok(wait)
    }

    /// Wait for a token, or fail with `RateLimited`
    pub async fn acquire(
        &self,
        provider: &str,
        organization: Option<&str>,
    ) -> Result<(), GatewayError> {
        let wait = self.reserve(provider, organization)?;
        if !wait.is_zero() {
            debug!(provider, ?organization, ?wait, "Rate limit wait");
            tokio::time::sleep(wait).await;
        }
        Ok(())
    }
}

/// Outermost gateway layer
pub struct RateLimitedProvider {
    inner: Arc<dyn ProviderCallPort>,
    limiter: RateLimiter,
}

impl RateLimitedProvider {
    pub fn new(inner: Arc<dyn ProviderCallPort>, settings: RateLimitSettings) -> Self {
        Self {
            inner,
            limiter: RateLimiter::new(settings),
        }
    }
}

#[async_trait]
impl ProviderCallPort for RateLimitedProvider {
    async fn call(&self, request: &ProviderRequest) -> Result<String, GatewayError> {
        self.limiter
            .acquire(&request.provider, request.organization.as_deref())
            .await?;
        self.inner.call(request).await
    }

    async fn call_streaming(
        &self,
        request: &ProviderRequest,
    ) -> Result<StreamHandle, GatewayError> {
        self.limiter
            .acquire(&request.provider, request.organization.as_deref())
            .await?;
        self.inner.call_streaming(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(capacity: u32, refill_per_second: f64, max_wait_ms: u64) -> RateLimiter {
        RateLimiter::new(RateLimitSettings {
            capacity,
            refill_per_second,
            max_wait_ms,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_wait() {
        let limiter = limiter(2, 1.0, 5_000);
        assert_eq!(limiter.reserve("openai", None).unwrap(), Duration::ZERO);
        assert_eq!(limiter.reserve("openai", None).unwrap(), Duration::ZERO);
        assert_eq!(limiter.reserve("openai", None).unwrap(), Duration::from_secs(1));
        // Queued behind the previous reservation
        assert_eq!(limiter.reserve("openai", None).unwrap(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_beyond_max_wait() {
        let limiter = limiter(1, 1.0, 500);
        limiter.reserve("openai", None).unwrap();
        let err = limiter.reserve("openai", None).unwrap_err();
        assert_eq!(
            err,
            GatewayError::RateLimited {
                provider: "openai".to_string(),
                retry_after_ms: 1_000,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_refills_over_time() {
        let limiter = limiter(1, 2.0, 0);
        limiter.reserve("openai", None).unwrap();
        assert!(limiter.reserve("openai", None).is_err());

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(limiter.reserve("openai", None).unwrap(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_buckets_are_per_organization() {
        let limiter = limiter(1, 1.0, 0);
        limiter.reserve("openai", Some("acme")).unwrap();
        assert!(limiter.reserve("openai", Some("acme")).is_err());
        assert!(limiter.reserve("openai", Some("globex")).is_ok());
        assert!(limiter.reserve("anthropic", Some("acme")).is_ok());
    }
}
