//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod event_publisher;
pub mod persistence;
pub mod progress;
pub mod provider_call;
pub mod rag_retrieval;
pub mod tool_execution;
