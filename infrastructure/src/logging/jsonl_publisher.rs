//! JSONL file writer for debate notifications.
//!
//! Each [`DebateNotification`] is serialized as a single JSON line with its
//! `type` tag, a `timestamp` and the event fields, appended to the file via a
//! buffered writer.

use agora_application::ports::event_publisher::{DebateNotification, EventPublisherPort};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL transcript publisher that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every line and on
/// `Drop`.
pub struct JsonlEventPublisher {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventPublisher {
    /// Open `path` for appending.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(event: &DebateNotification) -> Option<serde_json::Value> {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let mut value = serde_json::to_value(event).ok()?;
        if let serde_json::Value::Object(map) = &mut value {
            map.insert(
                "timestamp".to_string(),
                serde_json::Value::String(timestamp),
            );
        }
        Some(value)
    }
}

impl EventPublisherPort for JsonlEventPublisher {
    fn publish(&self, event: &DebateNotification) {
        let Some(line) = Self::record(event).and_then(|r| serde_json::to_string(&r).ok()) else {
            warn!(event = event.event_type(), "Could not serialize event");
            return;
        };

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!(path = %self.path.display(), error = %e, "Could not write event");
        }
    }
}

impl Drop for JsonlEventPublisher {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_domain::{DebateId, ParticipantId};

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_object_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debate.events.jsonl");
        let publisher = JsonlEventPublisher::new(&path).unwrap();
        let debate_id = DebateId::new();

        publisher.publish(&DebateNotification::DebateStarted {
            debate_id,
            topic: "Ban cars downtown".to_string(),
            participants: 2,
            max_rounds: 3,
        });
        publisher.publish(&DebateNotification::RoundCompleted {
            debate_id,
            round: 1,
            responses: 1,
            missed: vec![ParticipantId::new()],
            failed: vec![],
            timed_out: true,
        });
        drop(publisher);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert!(line["timestamp"].as_str().unwrap().ends_with('Z'));
        }
        assert_eq!(lines[0]["type"], "debate_started");
        assert_eq!(lines[0]["topic"], "Ban cars downtown");
        assert_eq!(lines[1]["type"], "round_completed");
        assert_eq!(lines[1]["missed"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_lines_are_visible_before_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/events.jsonl");
        let publisher = JsonlEventPublisher::new(&path).unwrap();

        publisher.publish(&DebateNotification::DebateArchived {
            debate_id: DebateId::new(),
        });

        assert_eq!(read_lines(publisher.path()).len(), 1);
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let event = DebateNotification::DebateFailed {
            debate_id: DebateId::new(),
            reason: "provider outage".to_string(),
        };

        JsonlEventPublisher::new(&path).unwrap().publish(&event);
        JsonlEventPublisher::new(&path).unwrap().publish(&event);

        assert_eq!(read_lines(&path).len(), 2);
    }
}
