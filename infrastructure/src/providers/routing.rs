use agora_application::ports::provider_call::{
    GatewayError, ProviderCallPort, ProviderRequest, StreamHandle,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Dispatches each request to the adapter registered under its provider id.
///
/// Resolution order:
///  1. the adapter registered for `request.provider`
///  2. the fallback adapter, if one is configured
///  3. `GatewayError::UnknownProvider`
#[derive(Default)]
pub struct ProviderRouter {
    adapters: HashMap<String, Arc<dyn ProviderCallPort>>,
    fallback: Option<Arc<dyn ProviderCallPort>>,
}

impl ProviderRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(
        mut self,
        id: impl Into<String>,
        adapter: Arc<dyn ProviderCallPort>,
    ) -> Self {
        self.adapters.insert(id.into(), adapter);
        self
    }

    pub fn with_fallback(mut self, adapter: Arc<dyn ProviderCallPort>) -> Self {
        self.fallback = Some(adapter);
        self
    }

    /// Registered provider ids, sorted
    pub fn provider_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.adapters.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn resolve(&self, provider: &str) -> Result<&dyn ProviderCallPort, GatewayError> {
        if let Some(adapter) = self.adapters.get(provider) {
            return Ok(adapter.as_ref());
        }
        self.fallback
            .as_deref()
            .ok_or_else(|| GatewayError::UnknownProvider(provider.to_string()))
    }
}

#[async_trait]
impl ProviderCallPort for ProviderRouter {
    async fn call(&self, request: &ProviderRequest) -> Result<String, GatewayError> {
        self.resolve(&request.provider)?.call(request).await
    }

    async fn call_streaming(
        &self,
        request: &ProviderRequest,
    ) -> Result<StreamHandle, GatewayError> {
        self.resolve(&request.provider)?
            .call_streaming(request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_domain::Model;

    // -- Mock adapter ----------------------------------------------------------

    struct Named(&'static str);

    #[async_trait]
    impl ProviderCallPort for Named {
        async fn call(&self, _request: &ProviderRequest) -> Result<String, GatewayError> {
            Ok(self.0.to_string())
        }
    }

    fn request(provider: &str) -> ProviderRequest {
        ProviderRequest::new(provider, Model::default(), "hi")
    }

    // -- Routing priority ------------------------------------------------------

    #[tokio::test]
    async fn registered_provider_takes_priority() {
        let router = ProviderRouter::new()
            .with_provider("anthropic", Arc::new(Named("anthropic")))
            .with_provider("openai", Arc::new(Named("openai")))
            .with_fallback(Arc::new(Named("fallback")));

        assert_eq!(router.call(&request("openai")).await.unwrap(), "openai");
        assert_eq!(router.call(&request("anthropic")).await.unwrap(), "anthropic");
    }

    #[tokio::test]
    async fn unregistered_provider_uses_fallback() {
        let router = ProviderRouter::new()
            .with_provider("anthropic", Arc::new(Named("anthropic")))
            .with_fallback(Arc::new(Named("fallback")));

        assert_eq!(router.call(&request("google")).await.unwrap(), "fallback");
    }

    #[tokio::test]
    async fn no_fallback_returns_unknown_provider() {
        let router = ProviderRouter::new().with_provider("anthropic", Arc::new(Named("a")));

        assert_eq!(
            router.call(&request("google")).await.unwrap_err(),
            GatewayError::UnknownProvider("google".to_string())
        );
    }

    #[test]
    fn provider_ids_are_sorted() {
        let router = ProviderRouter::new()
            .with_provider("openai", Arc::new(Named("o")))
            .with_provider("anthropic", Arc::new(Named("a")));
        assert_eq!(router.provider_ids(), vec!["anthropic", "openai"]);
    }

    // -- Streaming -------------------------------------------------------------

    #[tokio::test]
    async fn streaming_goes_through_the_same_adapter() {
        let router = ProviderRouter::new().with_provider("openai", Arc::new(Named("openai")));

        let handle = router.call_streaming(&request("openai")).await.unwrap();
        assert_eq!(handle.collect_text().await.unwrap(), "openai");
    }
}
