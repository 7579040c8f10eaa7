//! Tool trait definition

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::approval::ApprovalRequest;
use super::context::ToolContext;
use super::error::ToolError;
use crate::llm::ToolDefinition;

/// Error code for arguments that failed to decode into the tool's struct
pub const ERROR_INVALID_ARGS: i32 = -1;

/// A tool that can be called by the LLM
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (unique key in the registry and in the model's call)
    fn name(&self) -> &'static str;

    /// Prose shown to the model
    fn description(&self) -> &'static str;

    /// Accepted arguments
    fn parameters(&self) -> ParameterSchema;

    /// Whether a successful call ends the run
    fn is_terminal(&self) -> bool {
        false
    }

    /// Execute the tool
    ///
    /// Never fails past this boundary: argument and execution errors are
    /// reported inside the returned `ToolResult`.
    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult;

    /// Schema advertised to the LLM client
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.parameters().to_json())
    }
}

/// Decode a tool's argument object into its typed form
pub fn parse_args<T: DeserializeOwned>(tool: &str, input: Value) -> Result<T, ToolError> {
    debug!(%tool, "parse_args: called");
    serde_json::from_value(input).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// Text fed back to the model as the next prompt
    pub content: String,
    /// Error message when the execution failed
    pub error: Option<String>,
    /// Tool-specific error code, 0 on success
    pub error_code: i32,
    /// Change that must be reviewed before the loop continues
    pub approval: Option<ApprovalRequest>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(content: impl Into<String>) -> Self {
        debug!("ToolResult::success: called");
        Self {
            content: content.into(),
            error: None,
            error_code: 0,
            approval: None,
        }
    }

    /// Create an error result whose text is the error message
    pub fn error(error_code: i32, message: impl Into<String>) -> Self {
        let message = message.into();
        debug!(%error_code, "ToolResult::error: called");
        Self {
            content: format!("Error: {}", message),
            error: Some(message),
            error_code,
            approval: None,
        }
    }

    /// Create an error result that still carries useful output
    pub fn error_with_output(error_code: i32, content: impl Into<String>, message: impl Into<String>) -> Self {
        debug!(%error_code, "ToolResult::error_with_output: called");
        Self {
            content: content.into(),
            error: Some(message.into()),
            error_code,
            approval: None,
        }
    }

    /// Attach a change that needs human review
    pub fn with_approval(mut self, approval: ApprovalRequest) -> Self {
        self.approval = Some(approval);
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        ToolResult::error(err.code(), err.to_string())
    }
}

/// JSON type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    Array,
    Object,
}

/// One named parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub description: String,
}

/// Accepted argument names, types, and which are required
///
/// Properties keep declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSchema {
    pub properties: Vec<ParamSpec>,
    pub required: Vec<String>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter the model must always supply
    pub fn required(mut self, name: &str, kind: ParamType, description: &str) -> Self {
        self.required.push(name.to_string());
        self.optional(name, kind, description)
    }

    /// Add a parameter the model may omit
    pub fn optional(mut self, name: &str, kind: ParamType, description: &str) -> Self {
        self.properties.push(ParamSpec {
            name: name.to_string(),
            kind,
            description: description.to_string(),
        });
        self
    }

    /// Render as a JSON Schema object
    pub fn to_json(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .properties
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    serde_json::json!({ "type": p.kind, "description": p.description }),
                )
            })
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}
