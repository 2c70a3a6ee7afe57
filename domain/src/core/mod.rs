//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: strongly typed identifiers (debates, participants, rounds, flows)
//! - [`model::Model`]: LLM models a participant can be bound to
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod ids;
pub mod model;
