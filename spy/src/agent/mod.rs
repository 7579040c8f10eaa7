//! The agent step loop
//!
//! Query the LLM, parse a fenced tool call out of the reply, dispatch it, and
//! feed the result back until a terminal condition or an approval stop.

mod engine;
mod parser;
mod transcript;

pub use engine::{Agent, AgentError, RunOutcome, THINKING_TOOL, run_session};
pub use parser::{ParseError, ToolCall, parse_tool_call};
pub use transcript::{Speaker, Transcript, TranscriptEntry};
