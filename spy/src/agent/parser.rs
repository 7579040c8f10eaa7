//! Extract a tool call from free-form model output
//!
//! The model requests a tool by writing one fenced block:
//!
//! ````text
//! ```json
//! {"name": "bash", "arguments": {"command": "ls"}}
//! ```
//! ````
//!
//! A reply without such a block is a final answer.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

const FENCE: &str = "```";
const TAG: &str = "json";

/// A structured request to run a registered tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    /// Arguments as a JSON value for `Tool::execute`
    pub fn arguments_value(&self) -> Value {
        Value::Object(self.arguments.clone())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed tool call: {0}")]
    MalformedToolCall(String),
}

fn malformed(reason: impl Into<String>) -> ParseError {
    ParseError::MalformedToolCall(reason.into())
}

/// Byte offset just past the first ```` ```json ```` opener and its info line
fn find_json_fence(text: &str) -> Option<usize> {
    text.match_indices(FENCE).find_map(|(at, _)| {
        let after = &text[at + FENCE.len()..];
        let tag = after.get(..TAG.len())?;
        if !tag.eq_ignore_ascii_case(TAG) {
            return None;
        }
        let info = &after[TAG.len()..];
        if info.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            return None;
        }
        let start = at + FENCE.len() + TAG.len();
        // Skip the rest of the info line when the body starts on the next line
        Some(match info.find('\n') {
            Some(nl) if info[..nl].trim().is_empty() => start + nl + 1,
            _ => start,
        })
    })
}

/// Find and decode the first ```` ```json ```` block in `text`
///
/// Returns `Ok(None)` when there is no block at all.
pub fn parse_tool_call(text: &str) -> Result<Option<ToolCall>, ParseError> {
    debug!(len = text.len(), "parse_tool_call: called");
    let Some(body_start) = find_json_fence(text) else {
        debug!("parse_tool_call: no fenced block");
        return Ok(None);
    };

    let rest = &text[body_start..];
    let Some(close) = rest.find(FENCE) else {
        debug!("parse_tool_call: unterminated block");
        return Err(malformed("unterminated ```json block"));
    };

    let body = rest[..close].trim();
    let value: Value = serde_json::from_str(body).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;
    let Value::Object(mut object) = value else {
        return Err(malformed("expected a JSON object"));
    };

    let name = match object.remove("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name,
        Some(Value::String(_)) => return Err(malformed("`name` is empty")),
        Some(_) => return Err(malformed("`name` must be a string")),
        None => return Err(malformed("missing `name`")),
    };

    let arguments = match object.remove("arguments") {
        Some(Value::Object(args)) => args,
        None | Some(Value::Null) => Map::new(),
        Some(_) => return Err(malformed("`arguments` must be an object")),
    };

    debug!(%name, "parse_tool_call: decoded tool call");
    Ok(Some(ToolCall { name, arguments }))
}
