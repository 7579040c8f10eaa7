//! Session log - persists a session's events to a JSONL file
//!
//! Events are written to `<runs_dir>/<session-id>/events.jsonl`, one
//! `{timestamp, event, data}` object per line.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::types::StepEvent;

const LOG_FILE: &str = "events.jsonl";

/// One line of a session log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl LogEntry {
    /// Create a new entry stamped with the current time
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            event: event.into(),
            data,
        }
    }

    /// Entry for a step event
    pub fn from_step(event: &StepEvent) -> Self {
        let data = serde_json::to_value(event)
            .ok()
            .and_then(|mut v| v.get_mut("data").map(Value::take))
            .unwrap_or(Value::Null);
        Self::new(event.kind(), data)
    }
}

/// Where a session's events are recorded
///
/// Opened once when the session starts and closed when it ends.
pub trait SessionLog: Send {
    fn open(&mut self, session_id: &str) -> eyre::Result<()>;
    fn record(&mut self, entry: &LogEntry) -> eyre::Result<()>;
    fn close(&mut self);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSessionLog;

impl SessionLog for NullSessionLog {
    fn open(&mut self, _session_id: &str) -> eyre::Result<()> {
        Ok(())
    }

    fn record(&mut self, _entry: &LogEntry) -> eyre::Result<()> {
        Ok(())
    }

    fn close(&mut self) {}
}

/// Writes one JSONL file per session under `runs_dir`
pub struct JsonlSessionLog {
    runs_dir: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl JsonlSessionLog {
    pub fn new(runs_dir: impl AsRef<Path>) -> Self {
        let runs_dir = runs_dir.as_ref().to_path_buf();
        debug!(?runs_dir, "JsonlSessionLog::new: called");
        Self { runs_dir, writer: None }
    }

    /// Path of a session's log file
    pub fn log_path(runs_dir: impl AsRef<Path>, session_id: &str) -> PathBuf {
        runs_dir.as_ref().join(session_id).join(LOG_FILE)
    }
}

impl SessionLog for JsonlSessionLog {
    fn open(&mut self, session_id: &str) -> eyre::Result<()> {
        let log_path = Self::log_path(&self.runs_dir, session_id);
        debug!(?log_path, "JsonlSessionLog::open: called");
        if let Some(dir) = log_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&log_path)?;
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    fn record(&mut self, entry: &LogEntry) -> eyre::Result<()> {
        debug!(event = %entry.event, "JsonlSessionLog::record: called");
        let Some(writer) = self.writer.as_mut() else {
            return Err(eyre::eyre!("session log is not open"));
        };
        let json = serde_json::to_string(entry)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        debug!("JsonlSessionLog::close: called");
        if let Some(mut writer) = self.writer.take()
            && let Err(e) = writer.flush()
        {
            warn!(error = %e, "JsonlSessionLog::close: flush failed");
        }
    }
}

impl Drop for JsonlSessionLog {
    fn drop(&mut self) {
        self.close();
    }
}

/// Read a session's entries back, skipping lines that do not parse
pub fn read_session_log(runs_dir: impl AsRef<Path>, session_id: &str) -> eyre::Result<Vec<LogEntry>> {
    let log_path = JsonlSessionLog::log_path(runs_dir, session_id);
    debug!(?log_path, "read_session_log: reading log file");

    if !log_path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&log_path)?;
    let entries: Vec<LogEntry> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<LogEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(line, error = %e, "read_session_log: failed to parse line");
                None
            }
        })
        .collect();

    debug!(count = entries.len(), "read_session_log: loaded entries");
    Ok(entries)
}
