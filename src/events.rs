//! Change events for external integrations.
//!
//! Every committed repository change can be mirrored as a JSON line to
//! stdout or to a file.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::repo::Change;

pub const EVENT_SCHEMA_VERSION: &str = "homekeep.event.v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDestination {
    Stdout,
    File(PathBuf),
}

impl EventDestination {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed == "-" {
                return Some(EventDestination::Stdout);
            }
            Some(EventDestination::File(PathBuf::from(trimmed)))
        })
    }

    pub fn open(&self) -> Result<EventSink> {
        match self {
            EventDestination::Stdout => Ok(EventSink::stdout()),
            EventDestination::File(path) => EventSink::file(path),
        }
    }
}

/// Event kinds, one per repository change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    TaskStatusChanged,
    RecurrenceSpawned,
    StateReplaced,
    CategoryAdded,
    TemplatesSeeded,
}

impl EventKind {
    pub fn for_change(change: &Change) -> Self {
        match change {
            Change::Upserted { created: true, .. } => EventKind::TaskCreated,
            Change::Upserted { created: false, .. } => EventKind::TaskUpdated,
            Change::Deleted { .. } => EventKind::TaskDeleted,
            Change::StatusChanged { .. } => EventKind::TaskStatusChanged,
            Change::RecurrenceSpawned { .. } => EventKind::RecurrenceSpawned,
            Change::Replaced { .. } => EventKind::StateReplaced,
            Change::CategoryAdded { .. } => EventKind::CategoryAdded,
            Change::Seeded { .. } => EventKind::TemplatesSeeded,
        }
    }
}

/// A structured event with optional payload.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub schema_version: &'static str,
    pub event: EventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Event {
    pub fn new(event: EventKind) -> Self {
        Self {
            schema_version: EVENT_SCHEMA_VERSION,
            event,
            timestamp: Utc::now(),
            data: None,
        }
    }

    /// Attach a serializable payload to the event.
    pub fn with_data<T: Serialize>(mut self, data: T) -> Result<Self> {
        self.data = Some(serde_json::to_value(data)?);
        Ok(self)
    }

    /// The event describing a committed change, with the change as payload
    pub fn from_change(change: &Change) -> Result<Self> {
        Event::new(EventKind::for_change(change)).with_data(change)
    }
}

/// Event sink that writes JSONL output to a destination.
pub struct EventSink {
    writer: Box<dyn Write + Send>,
}

impl EventSink {
    pub fn stdout() -> Self {
        Self {
            writer: Box::new(std::io::stdout()),
        }
    }

    /// Emit events to a file, appending if it exists.
    pub fn file(path: &Path) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            writer: Box::new(file),
        })
    }

    #[cfg(test)]
    fn buffer(buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>) -> Self {
        struct Shared(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

        impl Write for Shared {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0
                    .lock()
                    .map_err(|_| std::io::Error::other("poisoned"))?
                    .write(buf)
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        Self {
            writer: Box::new(Shared(buffer)),
        }
    }

    /// Write a single event as JSONL.
    pub fn emit(&mut self, event: &Event) -> Result<()> {
        let serialized = serde_json::to_vec(event)?;
        self.writer.write_all(&serialized)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush().map_err(Error::Io)?;
        Ok(())
    }

    /// Emit the event for a change; failures are logged, not returned.
    pub fn emit_change(&mut self, change: &Change) {
        let result = Event::from_change(change).and_then(|event| self.emit(&event));
        if let Err(err) = result {
            tracing::warn!(%err, "failed to emit change event");
        }
    }
}
