//! SpyAgent - step-bounded tool-calling agent
//!
//! The agent sends a prompt to a language model, looks for a fenced JSON tool
//! call in the reply, runs the named tool, and feeds its output back until a
//! terminal tool fires, the model answers in plain text, or the step budget
//! runs out. Mutating tools pause the loop for operator approval.

pub mod agent;
pub mod cli;
pub mod config;
pub mod events;
pub mod llm;
pub mod prompts;
pub mod repl;
pub mod tools;

pub use agent::{Agent, AgentError, ParseError, RunOutcome, ToolCall, parse_tool_call, run_session};
pub use config::{AgentConfig, Config, LlmConfig};
pub use events::{StepEvent, Termination};
pub use llm::{LlmClient, LlmError};
pub use tools::{ApprovalDecision, ApprovalRequest, Tool, ToolContext, ToolError, ToolRegistry, ToolResult};
