//! Infrastructure layer for agora
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the resilient provider gateway, provider
//! adapters, repositories, transcript publishers, the local knowledge base
//! and configuration file loading.

pub mod config;
pub mod gateway;
pub mod knowledge;
pub mod logging;
pub mod persistence;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileDebateConfig, FileFlowsConfig,
    FileLoggingConfig, FileOutputConfig, FileOutputFormat, FileProvidersConfig,
};
pub use gateway::{CircuitState, GatewaySettings, HealthRegistry, ProviderGateway};
pub use knowledge::{KeywordRetriever, KnowledgeBase, LocalToolExecutor, Note};
pub use logging::{CompositeEventPublisher, JsonlEventPublisher, TracingEventPublisher};
pub use persistence::{InMemoryRepository, JsonFileDebateStore};
pub use providers::{ProviderRouter, ScriptedProvider};
