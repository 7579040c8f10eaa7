//! Step events and session logging
//!
//! The agent loop reports progress through `StepEvent`s handed to a caller
//! callback, and mirrors them into a `SessionLog`.

mod logger;
mod types;

pub use logger::{JsonlSessionLog, LogEntry, NullSessionLog, SessionLog, read_session_log};
pub use types::{StepEvent, Termination, word_chunks};
