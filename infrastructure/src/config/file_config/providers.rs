//! Provider configuration from TOML (`[providers]` section)

use agora_domain::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Offline scripted provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileScriptedConfig {
    /// Simulated latency per call
    pub latency_ms: u64,
    /// Value reported on "Confidence:" lines
    pub confidence: f64,
}

impl Default for FileScriptedConfig {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            confidence: 0.85,
        }
    }
}

impl FileScriptedConfig {
    pub fn latency(&self) -> Option<Duration> {
        (self.latency_ms > 0).then(|| Duration::from_millis(self.latency_ms))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    /// Provider id used when no routing rule matches
    pub default: Option<String>,
    /// Explicit model → provider routing overrides.
    pub routing: HashMap<String, String>,
    /// Organization that provider calls are billed to (rate-limit key)
    pub organization: Option<String>,
    pub scripted: FileScriptedConfig,
}

impl FileProvidersConfig {
    pub fn to_provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            default: self.default.clone(),
            routing: self.routing.clone(),
        }
    }

    /// Every provider id the configuration refers to
    pub fn referenced_providers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .default
            .iter()
            .chain(self.routing.values())
            .cloned()
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
