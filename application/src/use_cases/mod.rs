//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod debate_service;
pub mod round_coordinator;
pub mod run_debate;
