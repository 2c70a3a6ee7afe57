//! Response cache keyed by provider, model, prompt and call parameters

use super::settings::CacheSettings;
use agora_application::ports::provider_call::{GatewayError, ProviderCallPort, ProviderRequest};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    text: String,
    expires_at: Instant,
}

/// Innermost gateway layer, directly over the provider router
pub struct CachedProvider {
    inner: Arc<dyn ProviderCallPort>,
    settings: CacheSettings,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn ProviderCallPort>, settings: CacheSettings) -> Self {
        Self {
            inner,
            settings,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// SHA-256 over provider, model, prompt and the canonical parameters
    pub fn cache_key(request: &ProviderRequest) -> String {
        let params = serde_json::to_string(&request.params).unwrap_or_default();
        let mut hasher = Sha256::new();
        for part in [
            request.provider.as_str(),
            request.model.as_str(),
            request.prompt.as_str(),
            params.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str, now: Instant) -> Option<String> {
        let mut entries = self.entries();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.text.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn store(&self, key: String, text: String, expires_at: Instant, now: Instant) {
        let max_entries = self.settings.max_entries;
        if max_entries == 0 {
            return;
        }
        let mut entries = self.entries();
        if entries.len() >= max_entries {
            entries.retain(|_, entry| entry.expires_at > now);
        }
        if entries.len() >= max_entries
            && let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone())
        {
            entries.remove(&oldest);
        }
        entries.insert(key, CacheEntry { text, expires_at });
    }
}

#[async_trait]
impl ProviderCallPort for CachedProvider {
    async fn call(&self, request: &ProviderRequest) -> Result<String, GatewayError> {
        let ttl = self.settings.ttl(request.model.family());
        if ttl.is_zero() {
            return self.inner.call(request).await;
        }

        let key = Self::cache_key(request);
        if let Some(text) = self.lookup(&key, Instant::now()) {
            debug!(provider = %request.provider, model = %request.model, "Cache hit");
            return Ok(text);
        }

        let text = self.inner.call(request).await?;
        let now = Instant::now();
        self.store(key, text.clone(), now + ttl, now);
        Ok(text)
    }
}
