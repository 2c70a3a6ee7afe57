//! Agentic flows: configuration, results, execution history and the pure
//! text helpers the strategies share.
//!
//! The strategies themselves live in the application layer because they
//! call providers; everything here is synchronous and side-effect free.

pub mod config;
pub mod execution;
pub mod flow_type;
pub mod parsing;
pub mod result;
pub mod voting;

pub use config::{
    AgenticFlowConfiguration, CommonSettings, DEFAULT_MAX_CALLS, FlowSettings, RewriteRule,
    StrategySettings,
};
pub use execution::{AgenticFlow, AgenticFlowExecution, ExecutionScope, FlowStatistics, FlowStatus};
pub use flow_type::AgenticFlowType;
pub use result::{AgenticFlowResult, FlowMetrics, LOW_CONFIDENCE_METRIC, ProcessingStep};
pub use voting::{EnsembleTally, VoteCluster};
