//! One JSON document per debate in a directory

use agora_application::ports::persistence::{DebatePersistencePort, PersistenceError};
use agora_domain::{Debate, DebateId};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Stores each debate snapshot as `<dir>/<debate-id>.json`.
///
/// Writes go to a temporary file that is renamed over the previous snapshot,
/// so a reader never sees a half-written document.
#[derive(Debug, Clone)]
pub struct JsonFileDebateStore {
    dir: PathBuf,
}

impl JsonFileDebateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: DebateId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

fn storage(e: std::io::Error) -> PersistenceError {
    PersistenceError::Storage(e.to_string())
}

#[async_trait]
impl DebatePersistencePort for JsonFileDebateStore {
    async fn save(&self, debate: &Debate) -> Result<(), PersistenceError> {
        let json = serde_json::to_vec_pretty(debate)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        tokio::fs::create_dir_all(&self.dir).await.map_err(storage)?;

        let path = self.path_for(debate.id());
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(storage)?;
        tokio::fs::rename(&tmp, &path).await.map_err(storage)?;
        debug!(debate_id = %debate.id(), path = %path.display(), "Debate saved");
        Ok(())
    }

    async fn find(&self, id: DebateId) -> Result<Option<Debate>, PersistenceError> {
        let bytes = match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage(e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    async fn list_ids(&self) -> Result<Vec<DebateId>, PersistenceError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage(e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(storage)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match stem.parse::<DebateId>() {
                Ok(id) => ids.push(id),
                Err(_) => warn!(path = %path.display(), "Skipping file with non-debate name"),
            }
        }
        ids.sort();
        Ok(ids)
    }
}
