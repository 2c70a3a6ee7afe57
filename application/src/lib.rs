//! Application layer for agora
//!
//! This crate contains the debate service, the agentic flow executor,
//! port definitions, and service parameters.
//! It depends only on the domain layer.

pub mod config;
pub mod flows;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::ServiceParams;
pub use flows::{
    AgenticFlowExecutor, FlowError, FlowExecutionError, FlowRegistry, FlowServices, FlowStrategy,
    FlowTarget,
};
pub use ports::{
    event_publisher::{DebateNotification, EventPublisherPort, NoEventPublisher},
    persistence::{
        DebatePersistencePort, ExecutionRepositoryPort, FlowRepositoryPort, PersistenceError,
    },
    progress::{DebateProgressNotifier, NoProgress},
    provider_call::{GatewayError, ProviderAdminPort, ProviderCallPort, ProviderRequest},
    rag_retrieval::{NoRetrieval, RagRetrievalPort, RetrievalError, RetrievedDocument},
    tool_execution::{NoTools, ToolExecutionError, ToolExecutionPort},
};
pub use use_cases::debate_service::{
    DebateService, DebateServiceBuilder, DebateServiceError, FlowRequest, FlowSelection,
    TurnInput,
};
pub use use_cases::run_debate::{RunDebateError, RunDebateUseCase};
