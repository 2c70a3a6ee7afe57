//! Domain layer for agora
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns and
//! performs no I/O.
//!
//! # Core Concepts
//!
//! ## Debate
//!
//! A [`Debate`] is the aggregate root. It owns its participants, rounds and
//! responses, and every mutation is checked against the lifecycle table in
//! [`debate::state`]:
//!
//! ```text
//! CREATED ─INITIALIZE→ INITIALIZED ─START→ IN_PROGRESS ⟲ SUBMIT_RESPONSE
//!                                             │ COMPLETE_ROUND
//!                                             ▼
//!                     IN_PROGRESS ←START─ ROUND_COMPLETE ─END_DEBATE→ DEBATE_COMPLETE ─ARCHIVE→ ARCHIVED
//! IN_PROGRESS | ROUND_COMPLETE ─ERROR→ ERROR
//! ```
//!
//! ## Agentic Flows
//!
//! Twelve reasoning-augmentation strategies ([`AgenticFlowType`]) wrap a raw
//! model call. This crate holds their configuration, results and the pure
//! text helpers; the strategies themselves run in the application layer.

pub mod core;
pub mod debate;
pub mod flow;
pub mod prompt;
pub mod providers;

// Re-export commonly used types
pub use core::{
    error::DomainError,
    ids::{DebateId, ExecutionId, FlowId, ParticipantId, ResponseId, RoundId},
    model::{Model, ModelFamily},
};
pub use debate::{
    Debate, DebateConfig, DebateEvent, DebateStatus, NewParticipant, Participant,
    ParticipantType, Position, Response, ResponseDraft, Round, RoundAdvance, RoundClosure,
    RoundStatus, RunToMaxRounds, StopWhenSilent, SubmitOutcome, TerminationDecision,
    TerminationPolicy, TurnOrder, TurnSlot, TurnState, TurnTicket,
};
pub use flow::{
    AgenticFlow, AgenticFlowConfiguration, AgenticFlowExecution, AgenticFlowResult,
    AgenticFlowType, CommonSettings, EnsembleTally, ExecutionScope, FlowMetrics, FlowSettings,
    FlowStatistics, FlowStatus, ProcessingStep, RewriteRule, StrategySettings,
};
pub use prompt::{FlowPromptTemplate, PromptTemplate, TranscriptEntry};
pub use providers::{ProviderConfig, ProviderHealth};
