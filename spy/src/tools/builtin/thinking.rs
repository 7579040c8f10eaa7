//! thinking tool - private deliberation before each query

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::tools::{ParamType, ParameterSchema, Tool, ToolContext, ToolResult, parse_args};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThinkingArgs {
    step: u32,
    rethink: bool,
    content: String,
    summary: String,
}

/// Records a reasoning step; the output is shown to the operator only
pub struct ThinkingTool;

#[async_trait]
impl Tool for ThinkingTool {
    fn name(&self) -> &'static str {
        "thinking"
    }

    fn description(&self) -> &'static str {
        "Think through the current step before acting. The content is shown to the user, not executed."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required("step", ParamType::Integer, "Current step number")
            .optional("rethink", ParamType::Boolean, "Whether this revises an earlier thought")
            .required("content", ParamType::String, "The thought itself")
            .optional("summary", ParamType::String, "One-line summary of the thought")
    }

    async fn execute(&self, input: Value, _ctx: &ToolContext) -> ToolResult {
        debug!("ThinkingTool::execute: called");
        let args: ThinkingArgs = parse_args(self.name(), input).unwrap_or_else(|e| {
            warn!(%e, "ThinkingTool::execute: ignoring undecodable arguments");
            ThinkingArgs::default()
        });
        debug!(step = %args.step, rethink = %args.rethink, summary = %args.summary, "ThinkingTool::execute: decoded");

        ToolResult::success(args.content)
    }
}
