//! Application-level configuration.
//!
//! - [`ServiceParams`]: debate service and automated runner control (grace
//!   period, default model, turn attempts, flow timeout)

pub mod service_params;

pub use service_params::ServiceParams;
