//! Prompt templates
//!
//! The system prompt is a Handlebars template listing the registered tools and
//! the fenced-JSON calling convention. A file at
//! `<working dir>/.spyagent/prompts/system.pmt` overrides the embedded copy.

pub mod embedded;
mod loader;

pub use loader::{ParameterSummary, PromptLoader, SystemPromptContext, ToolSummary, default_system_prompt};
