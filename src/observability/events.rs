//! JSONL event log.
//!
//! Each [`TimerEvent`] becomes one JSON line wrapped in an envelope that
//! adds a sequence number, a wall-clock timestamp and the session id. The
//! event's own fields (including its `"type"` tag) are flattened into the
//! same object.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::SinkError;
use crate::notify::{NotificationSink, TimerEvent};

#[derive(Debug, Serialize)]
struct EventEnvelope<'a> {
    sequence: u64,
    timestamp: DateTime<Utc>,
    session_id: Uuid,
    #[serde(flatten)]
    event: &'a TimerEvent,
}

/// Thread-safe, buffered JSONL event writer.
///
/// Every line is flushed as soon as it is written so a reader tailing the
/// log sees events as they happen.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
    session_id: Uuid,
}

// Box<dyn Write> is not Debug.
impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("session_id", &self.session_id)
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter with a fresh session id.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
            session_id: Uuid::new_v4(),
        }
    }

    /// Creates an emitter that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates an emitter that discards everything.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates (or truncates) a log file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Session id stamped on every line.
    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Number of events written or attempted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Writes one event as a JSONL line.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if encoding or writing fails. The sequence
    /// number is consumed either way.
    pub fn emit(&self, event: &TimerEvent) -> Result<(), SinkError> {
        let envelope = EventEnvelope {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            timestamp: Utc::now(),
            session_id: self.session_id,
            event,
        };
        let line = serde_json::to_string(&envelope)?;

        let mut w = self
            .writer
            .lock()
            .map_err(|_| SinkError::Rejected("event writer poisoned".to_string()))?;
        writeln!(w, "{line}")?;
        w.flush()?;
        Ok(())
    }
}

impl NotificationSink for EventEmitter {
    fn notify(&self, event: &TimerEvent) -> Result<(), SinkError> {
        self.emit(event)
    }
}
