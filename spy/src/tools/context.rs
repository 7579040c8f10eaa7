//! ToolContext - execution context for tools

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Execution context for tools - scoped to a single agent session
///
/// Set once before the loop starts; tools read it but never write it.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Directory commands run in; the process cwd when `None`
    pub working_dir: Option<PathBuf>,

    /// Session ID (for log correlation)
    pub session_id: String,

    /// Upper bound on a single subprocess; unbounded when `None`
    pub command_timeout: Option<Duration>,
}

impl ToolContext {
    /// Create a new tool context
    pub fn new(working_dir: Option<PathBuf>, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        debug!(?working_dir, %session_id, "ToolContext::new: called");
        Self {
            working_dir,
            session_id,
            command_timeout: None,
        }
    }

    /// Builder method to bound subprocess runtime
    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        debug!(?timeout, "ToolContext::with_command_timeout: called");
        self.command_timeout = timeout;
        self
    }

    /// Working directory, if one was configured
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }
}
