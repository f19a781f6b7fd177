use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use uuid::Uuid;

use pawmatch_logging::{EventLog, LogEvent, Stage};

/// Cloneable telemetry handle bound to one session.
///
/// Emission is best-effort: sessions ignore failures rather than letting a
/// full disk interrupt an interview.
#[derive(Debug, Clone)]
pub struct SessionTelemetry {
    log: Arc<EventLog>,
    session: Uuid,
}

impl SessionTelemetry {
    /// Binds a shared event log to a session id.
    #[must_use]
    pub const fn new(log: Arc<EventLog>, session: Uuid) -> Self {
        Self { log, session }
    }

    /// The session this handle reports for.
    #[must_use]
    pub const fn session(&self) -> Uuid {
        self.session
    }

    /// Appends one event to the log.
    ///
    /// # Errors
    ///
    /// Serialization or I/O errors from the underlying log.
    pub fn emit(&self, stage: Stage, detail: Value) -> Result<()> {
        self.log.append(&LogEvent::new(self.session, stage, detail))
    }
}
