//! Repository adapters for debates, flows and flow executions

mod json_file;
mod memory;

pub use json_file::JsonFileDebateStore;
pub use memory::InMemoryRepository;
