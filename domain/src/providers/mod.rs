//! Provider bindings and health (provider-neutral, no I/O).

pub mod health;

pub use health::ProviderHealth;

use crate::core::model::Model;
use std::collections::HashMap;

/// Which provider serves which model.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// Default provider id used when no routing rule matches.
    pub default: Option<String>,
    /// Explicit model → provider routing overrides.
    pub routing: HashMap<String, String>,
}

impl ProviderConfig {
    /// Resolve the provider for `model`: explicit routing first, then the
    /// model family's conventional provider, then `default`.
    pub fn resolve(&self, model: &Model) -> Option<String> {
        if let Some(provider) = self.routing.get(model.as_str()) {
            return Some(provider.clone());
        }
        self.default
            .clone()
            .or_else(|| model.family().default_provider().map(String::from))
    }
}
