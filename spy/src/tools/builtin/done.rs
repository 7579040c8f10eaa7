//! done tool - end the run with a final message

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::tools::{ParamType, ParameterSchema, Tool, ToolContext, ToolResult, parse_args};

#[derive(Debug, Deserialize)]
struct DoneArgs {
    message: String,
}

/// Terminal tool: its message is the run's final answer
pub struct DoneTool;

#[async_trait]
impl Tool for DoneTool {
    fn name(&self) -> &'static str {
        "done"
    }

    fn description(&self) -> &'static str {
        "Finish the task. Call this once the work is complete, passing the final answer for the user as `message`."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new().required("message", ParamType::String, "Final answer shown to the user")
    }

    fn is_terminal(&self) -> bool {
        true
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "DoneTool::execute: called");
        let args: DoneArgs = match parse_args(self.name(), input) {
            Ok(args) => args,
            Err(e) => return e.into(),
        };

        info!(session_id = %ctx.session_id, "Task completion signaled");
        ToolResult::success(args.message)
    }
}
