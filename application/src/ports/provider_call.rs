//! Provider call port
//!
//! Defines the interface for sending a prompt to an external LLM provider.
//! The resilience middleware (rate limit, circuit breaker, retry, cache)
//! implements the same trait and wraps another implementation.

use agora_domain::{Model, ProviderHealth};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur when calling a provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Rate limited on provider {provider} (retry in {retry_after_ms}ms)")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Circuit open for provider {0}")]
    CircuitOpen(String),

    #[error("Provider {0} is disabled")]
    ProviderDisabled(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Coarse classification of [`GatewayError`], used by retry allow-lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorKind {
    RateLimited,
    CircuitOpen,
    ProviderDisabled,
    UnknownProvider,
    Timeout,
    Connection,
    RequestFailed,
    InvalidRequest,
}

impl GatewayError {
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            GatewayError::RateLimited { .. } => GatewayErrorKind::RateLimited,
            GatewayError::CircuitOpen(_) => GatewayErrorKind::CircuitOpen,
            GatewayError::ProviderDisabled(_) => GatewayErrorKind::ProviderDisabled,
            GatewayError::UnknownProvider(_) => GatewayErrorKind::UnknownProvider,
            GatewayError::Timeout(_) => GatewayErrorKind::Timeout,
            GatewayError::ConnectionError(_) => GatewayErrorKind::Connection,
            GatewayError::RequestFailed(_) => GatewayErrorKind::RequestFailed,
            GatewayError::InvalidRequest(_) => GatewayErrorKind::InvalidRequest,
        }
    }

    /// Whether the provider is (temporarily) unavailable, as opposed to the
    /// request itself being wrong. A turn failing this way may be retried.
    pub fn is_unavailable(&self) -> bool {
        !matches!(
            self,
            GatewayError::InvalidRequest(_) | GatewayError::UnknownProvider(_)
        )
    }
}

/// Sampling parameters forwarded to the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallParameters {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
}

/// One call to one provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub provider: String,
    pub model: Model,
    pub prompt: String,
    pub params: CallParameters,
    /// Organization the call is billed to (rate limit key)
    pub organization: Option<String>,
    /// Upper bound for this call, usually the remaining round budget
    pub timeout: Option<Duration>,
}

impl ProviderRequest {
    pub fn new(provider: impl Into<String>, model: Model, prompt: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model,
            prompt: prompt.into(),
            params: CallParameters::default(),
            organization: None,
            timeout: None,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.params.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.params.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.params.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A chunk of a streaming response
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A text chunk from the model
    Delta(String),
    /// The complete response text (signals stream end)
    Completed(String),
    /// An error that occurred during streaming
    Error(String),
}

/// Handle for receiving streaming events from a provider call.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        return Ok(text);
                    }
                    return Ok(full_text);
                }
                StreamEvent::Error(e) => {
                    return Err(GatewayError::RequestFailed(e));
                }
            }
        }
        // Channel closed without Completed, return what we have
        Ok(full_text)
    }
}

/// Boundary to external language-model providers
///
/// Implementations (adapters and middleware) live in the infrastructure
/// layer.
#[async_trait]
pub trait ProviderCallPort: Send + Sync {
    /// Send a prompt and wait for the full response text
    async fn call(&self, request: &ProviderRequest) -> Result<String, GatewayError>;

    /// Send a prompt and get a streaming response.
    ///
    /// Default implementation calls `call()` and wraps the result in a single
    /// `Completed` event.
    async fn call_streaming(
        &self,
        request: &ProviderRequest,
    ) -> Result<StreamHandle, GatewayError> {
        let result = self.call(request).await?;
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.send(StreamEvent::Completed(result)).await;
        Ok(StreamHandle::new(rx))
    }
}

/// Operator surface of the provider gateway
pub trait ProviderAdminPort: Send + Sync {
    /// Health counters for one provider
    fn health(&self, provider: &str) -> ProviderHealth;

    /// Health counters for every provider seen so far
    fn health_report(&self) -> Vec<ProviderHealth>;

    /// Open the circuit until [`ProviderAdminPort::reset`] is called
    fn force_open(&self, provider: &str);

    /// Reject every call to this provider until reset
    fn disable(&self, provider: &str);

    /// Clear breaker window, overrides and health counters
    fn reset(&self, provider: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ProviderCallPort for Echo {
        async fn call(&self, request: &ProviderRequest) -> Result<String, GatewayError> {
            Ok(request.prompt.clone())
        }
    }

    #[tokio::test]
    async fn test_default_streaming_wraps_call() {
        let request = ProviderRequest::new("echo", Model::default(), "hello");
        let handle = Echo.call_streaming(&request).await.unwrap();
        assert_eq!(handle.collect_text().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_collect_text_concatenates_deltas() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(StreamEvent::Delta("a".into())).await.unwrap();
        tx.send(StreamEvent::Delta("b".into())).await.unwrap();
        tx.send(StreamEvent::Completed("ab".into())).await.unwrap();
        drop(tx);
        assert_eq!(StreamHandle::new(rx).collect_text().await.unwrap(), "ab");
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(GatewayError::CircuitOpen("p".into()).is_unavailable());
        assert!(GatewayError::Timeout(Duration::from_secs(1)).is_unavailable());
        assert!(!GatewayError::InvalidRequest("bad".into()).is_unavailable());
        assert_eq!(
            GatewayError::ConnectionError("reset".into()).kind(),
            GatewayErrorKind::Connection
        );
    }
}
