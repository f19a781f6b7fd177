#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Structured JSONL event logging for recommender sessions.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// A user answer entered a profile.
    AnswerRecorded,
    /// The selector picked the next question.
    QuestionSelected,
    /// A ranking was computed for a session.
    RankingComputed,
    /// A new catalog version was swapped in.
    CatalogSwapped,
    /// A session reached its natural end.
    SessionClosed,
}

/// One structured log event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// Timestamp in UTC.
    pub at: DateTime<Utc>,
    /// Session the event belongs to.
    pub session: Uuid,
    /// Lifecycle stage.
    pub stage: Stage,
    /// Arbitrary JSON detail payload.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub detail: serde_json::Value,
}

impl LogEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(session: Uuid, stage: Stage, detail: serde_json::Value) -> Self {
        Self {
            at: Utc::now(),
            session,
            stage,
            detail,
        }
    }
}

/// Append-only JSONL event log, safe to share across threads.
#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    writer: Mutex<File>,
}

impl EventLog {
    /// Creates or opens the log file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// I/O errors from directory creation or opening the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    /// Appends one event as a JSON line.
    ///
    /// # Errors
    ///
    /// Serialization or I/O errors; callers treating logging as best-effort
    /// may ignore them.
    pub fn append(&self, event: &LogEvent) -> Result<()> {
        let mut writer = self.writer.lock();
        serde_json::to_writer(&mut *writer, event)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// The underlying file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn appends_events_as_json_lines() {
        let dir = tempdir().unwrap();
        let log = EventLog::open(dir.path().join("session.log")).unwrap();
        let session = Uuid::new_v4();
        log.append(&LogEvent::new(
            session,
            Stage::AnswerRecorded,
            json!({ "criterion": "apartment_ok", "kind": "confirm" }),
        ))
        .unwrap();
        log.append(&LogEvent::new(session, Stage::SessionClosed, json!(null)))
            .unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: LogEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.stage, Stage::AnswerRecorded);
        assert_eq!(first.detail["criterion"], "apartment_ok");
        // Null detail is omitted entirely.
        assert!(!lines[1].contains("detail"));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("logs/sessions/today.log");
        let log = EventLog::open(&nested).unwrap();
        assert_eq!(log.path(), nested.as_path());
    }
}
