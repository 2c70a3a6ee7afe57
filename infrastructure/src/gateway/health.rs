//! Process-wide provider health counters and operator overrides

use agora_domain::ProviderHealth;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Health counters keyed by provider id, shared by every gateway layer
#[derive(Debug, Default)]
pub struct HealthRegistry {
    providers: Mutex<HashMap<String, ProviderHealth>>,
    disabled: Mutex<HashSet<String>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self) -> MutexGuard<'_, HashMap<String, ProviderHealth>> {
        self.providers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn disabled_set(&self) -> MutexGuard<'_, HashSet<String>> {
        self.disabled.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record_success(&self, provider: &str) {
        self.counters()
            .entry(provider.to_string())
            .or_insert_with(|| ProviderHealth::new(provider))
            .record_success(Utc::now());
    }

    pub fn record_failure(&self, provider: &str, error: &str) {
        self.counters()
            .entry(provider.to_string())
            .or_insert_with(|| ProviderHealth::new(provider))
            .record_failure(error, Utc::now());
    }

    /// Counters for `provider` (all zero if it was never called)
    pub fn get(&self, provider: &str) -> ProviderHealth {
        self.counters()
            .get(provider)
            .cloned()
            .unwrap_or_else(|| ProviderHealth::new(provider))
    }

    /// Counters for every provider seen so far, sorted by id
    pub fn report(&self) -> Vec<ProviderHealth> {
        let mut report: Vec<ProviderHealth> = self.counters().values().cloned().collect();
        report.sort_by(|a, b| a.provider.cmp(&b.provider));
        report
    }

    pub fn disable(&self, provider: &str) {
        self.disabled_set().insert(provider.to_string());
    }

    pub fn is_disabled(&self, provider: &str) -> bool {
        self.disabled_set().contains(provider)
    }

    /// Clear the counters and the disabled flag of `provider`
    pub fn reset(&self, provider: &str) {
        self.counters().remove(provider);
        self.disabled_set().remove(provider);
    }
}
