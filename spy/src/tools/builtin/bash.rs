//! bash tool - execute shell commands

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::process::Output;
use tracing::debug;

use crate::tools::{ParamType, ParameterSchema, Tool, ToolContext, ToolError, ToolResult, parse_args};

/// Largest output returned to the model, in bytes
pub const MAX_OUTPUT_BYTES: usize = 30_000;

#[derive(Debug, Deserialize)]
struct BashArgs {
    command: String,
    // Each call spawns a fresh shell, so there is nothing to restart.
    #[serde(default)]
    #[allow(dead_code)]
    restart: bool,
}

/// Run a command with `sh -c` in the session's working directory
pub struct BashTool;

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &'static str {
        "bash"
    }

    fn description(&self) -> &'static str {
        "Run a command in a bash shell and return its combined stdout and stderr.\n\
         * The command does not need to be escaped.\n\
         * Create files with shell redirection and peek at them with cat or sed, \
         e.g. 'sed -n 10,25p /path/to/file'.\n\
         * Avoid commands that produce a very large amount of output."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required("command", ParamType::String, "bash command to run")
            .optional("restart", ParamType::Boolean, "restart the terminal")
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "BashTool::execute: called");
        let args: BashArgs = match parse_args(self.name(), input) {
            Ok(args) => args,
            Err(e) => return e.into(),
        };

        let output = match run(&args.command, ctx).await {
            Ok(output) => output,
            Err(e) => {
                debug!(%e, "BashTool::execute: command did not run");
                return e.into();
            }
        };

        let combined = truncate_output(combine(&output));
        if output.status.success() {
            debug!("BashTool::execute: command succeeded");
            ToolResult::success(combined)
        } else {
            let message = match output.status.code() {
                Some(code) => format!("exit status {}", code),
                None => "terminated by signal".to_string(),
            };
            debug!(%message, "BashTool::execute: command failed");
            ToolResult::error_with_output(1, format!("{}\n[Error] {}", combined, message), message)
        }
    }
}

async fn run(command: &str, ctx: &ToolContext) -> Result<Output, ToolError> {
    debug!(%command, "run: spawning command");
    let mut cmd = tokio::process::Command::new("sh");
    // stderr shares stdout's pipe so the two streams stay interleaved
    cmd.arg("-c").arg(format!("exec 2>&1\n{}", command)).kill_on_drop(true);
    if let Some(dir) = ctx.working_dir() {
        cmd.current_dir(dir);
    }

    match ctx.command_timeout {
        Some(limit) => tokio::time::timeout(limit, cmd.output())
            .await
            .map_err(|_| ToolError::CommandTimeout {
                timeout_ms: limit.as_millis() as u64,
            })?
            .map_err(ToolError::from),
        None => cmd.output().await.map_err(ToolError::from),
    }
}

fn combine(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

/// Cap output at `MAX_OUTPUT_BYTES`, cutting on a char boundary
pub fn truncate_output(text: String) -> String {
    if text.len() <= MAX_OUTPUT_BYTES {
        return text;
    }
    let mut cut = MAX_OUTPUT_BYTES;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    debug!(total = text.len(), %cut, "truncate_output: truncating");
    format!("{}...\n[truncated, {} bytes total]", &text[..cut], text.len())
}
