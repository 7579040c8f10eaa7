//! Tool system for the step loop
//!
//! Tools are registered once per session and invoked by name when the model
//! emits a fenced tool call.

mod approval;
pub mod builtin;
mod context;
mod error;
mod registry;
mod traits;

pub use approval::{ApprovalDecision, ApprovalRequest};
pub use context::ToolContext;
pub use error::ToolError;
pub use registry::ToolRegistry;
pub use traits::{ERROR_INVALID_ARGS, ParamSpec, ParamType, ParameterSchema, Tool, ToolResult, parse_args};
