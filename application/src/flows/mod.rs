//! Agentic flows: reasoning-augmentation strategies run before a turn is
//! submitted to a debate.

pub mod context;
pub mod error;
pub mod executor;
pub mod registry;
pub mod strategies;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{FlowContext, FlowServices, FlowTarget};
pub use error::{FlowError, FlowExecutionError};
pub use executor::AgenticFlowExecutor;
pub use registry::FlowRegistry;
pub use strategy::{FlowStrategy, StrategyOutput};
