//! Agentic flow defaults from TOML (`[flows]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFlowsConfig {
    /// Provider call budget applied to flows configured from the command line
    pub max_calls: u32,
    /// Extra time in-flight turns get after the round budget runs out
    pub grace_seconds: u64,
    /// Upper bound for one execution when the round has no time limit
    /// (0 = unbounded)
    pub timeout_seconds: u64,
    /// Directory of `.md`/`.txt` notes for the tool-calling and RAG flows
    pub knowledge_dir: Option<PathBuf>,
}

impl Default for FileFlowsConfig {
    fn default() -> Self {
        Self {
            max_calls: agora_domain::flow::config::DEFAULT_MAX_CALLS,
            grace_seconds: 2,
            timeout_seconds: 300,
            knowledge_dir: None,
        }
    }
}

impl FileFlowsConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_seconds)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}
