//! Notes that back the local tools and keyword retrieval

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Files larger than this are skipped when loading a directory
const MAX_NOTE_SIZE: u64 = 256 * 1024;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One document
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: String,
    pub content: String,
    /// Visible to every organization when `None`
    pub organization: Option<String>,
}

impl Note {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            organization: None,
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn visible_to(&self, organization: Option<&str>) -> bool {
        match (&self.organization, organization) {
            (None, _) => true,
            (Some(owner), Some(org)) => owner == org,
            (Some(_), None) => false,
        }
    }
}

/// An in-memory set of notes
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    notes: Vec<Note>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }

    /// Load every `.md` and `.txt` file directly inside `dir`. The file stem
    /// becomes the note id.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, KnowledgeError> {
        let dir = dir.as_ref();
        let io = |source| KnowledgeError::Io {
            path: dir.display().to_string(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io)? {
            let path = entry.map_err(io)?.path();
            let is_text = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("md") | Some("txt")
            );
            if is_text && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut base = Self::new();
        for path in paths {
            if fs::metadata(&path).is_ok_and(|m| m.len() > MAX_NOTE_SIZE) {
                debug!(path = %path.display(), "Skipping oversized note");
                continue;
            }
            let content = fs::read_to_string(&path).map_err(|source| KnowledgeError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            base.notes.push(Note::new(id, content));
        }
        debug!(dir = %dir.display(), notes = base.notes.len(), "Knowledge base loaded");
        Ok(base)
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Lowercase alphanumeric terms of at least three characters
pub(crate) fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 3)
        .map(|t| t.to_lowercase())
        .collect()
}
