//! Tool error types

use thiserror::Error;

use super::traits::ERROR_INVALID_ARGS;

/// Errors that can occur while registering or executing tools
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool already registered: {name}")]
    DuplicateTool { name: String },

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("target required for replace")]
    EmptyTarget,

    #[error("invalid index {index} for input of length {len}")]
    InvalidIndex { index: i64, len: usize },

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("no conversation history provided")]
    EmptyHistory,

    #[error("{field} at index {index} is empty")]
    BlankEntry { index: usize, field: &'static str },

    #[error("Command timed out after {timeout_ms}ms")]
    CommandTimeout { timeout_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Numeric code reported in `ToolResult::error_code`
    pub fn code(&self) -> i32 {
        match self {
            ToolError::InvalidArguments { .. } => ERROR_INVALID_ARGS,
            ToolError::EmptyTarget => 1,
            ToolError::InvalidIndex { .. } => 2,
            ToolError::UnknownOperation(_) => 3,
            ToolError::EmptyHistory | ToolError::BlankEntry { .. } => 3,
            ToolError::CommandTimeout { .. } => 3,
            ToolError::Io(_) => 2,
            ToolError::DuplicateTool { .. } => ERROR_INVALID_ARGS,
        }
    }
}
