//! Provider adapters behind the gateway

pub mod routing;
pub mod scripted;

pub use routing::ProviderRouter;
pub use scripted::ScriptedProvider;
