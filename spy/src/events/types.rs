//! Step events emitted by the agent loop

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tools::ApprovalRequest;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum Termination {
    /// The model replied without a tool call
    FinalAnswer(String),
    /// The terminal tool fired with this message
    Done(String),
    /// The reply contained a tool call that could not be decoded
    MalformedToolCall(String),
    /// The model named a tool that is not registered
    ToolNotFound(String),
    /// The step budget ran out
    StepLimitReached,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::FinalAnswer(_) => write!(f, "Final answer received"),
            Termination::Done(_) => write!(f, "Task marked done"),
            Termination::MalformedToolCall(reason) => write!(f, "Stopped on a malformed tool call: {}", reason),
            Termination::ToolNotFound(name) => write!(f, "Stopped: tool '{}' is not registered", name),
            Termination::StepLimitReached => write!(f, "Stopped: step limit reached"),
        }
    }
}

/// Something the operator should see while a run progresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum StepEvent {
    /// Output of the thinking tool
    Thinking(String),
    /// A chunk of the model's reply
    Text(String),
    /// A tool is about to run
    ToolUsage { step: u32, tool: String },
    /// A non-terminal tool finished
    ToolResult { tool: String, content: String, is_error: bool },
    /// A change is waiting for review
    ApprovalRequest(ApprovalRequest),
    /// The run ended
    Terminal(Termination),
    /// The LLM client failed
    Failure(String),
}

impl StepEvent {
    /// Snake-case name used in the session log
    pub fn kind(&self) -> &'static str {
        match self {
            StepEvent::Thinking(_) => "thinking",
            StepEvent::Text(_) => "text",
            StepEvent::ToolUsage { .. } => "tool_usage",
            StepEvent::ToolResult { .. } => "tool_result",
            StepEvent::ApprovalRequest(_) => "approval_request",
            StepEvent::Terminal(_) => "terminal",
            StepEvent::Failure(_) => "failure",
        }
    }

    /// Whether this event ends the run
    pub fn is_final(&self) -> bool {
        matches!(self, StepEvent::Terminal(_) | StepEvent::Failure(_))
    }
}

/// Split a reply into word-sized chunks, keeping the separators
///
/// Concatenating the chunks yields the input exactly.
pub fn word_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if c.is_whitespace() {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
