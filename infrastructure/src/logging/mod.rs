//! Debate transcript publishers.
//!
//! Provides adapters for the
//! [`EventPublisherPort`](agora_application::EventPublisherPort):
//! [`JsonlEventPublisher`] appends a machine-readable transcript,
//! [`TracingEventPublisher`] mirrors events into the diagnostic log and
//! [`CompositeEventPublisher`] fans out to several of them.

mod composite;
mod jsonl_publisher;
mod tracing_publisher;

pub use composite::CompositeEventPublisher;
pub use jsonl_publisher::JsonlEventPublisher;
pub use tracing_publisher::TracingEventPublisher;
