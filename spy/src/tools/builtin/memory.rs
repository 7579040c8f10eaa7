//! summarize_memory tool - keep prompt/response pairs and summarize them

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::tools::{ParamType, ParameterSchema, Tool, ToolContext, ToolError, ToolResult, parse_args};

/// One prompt/response interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    #[serde(default)]
    pub id: String,
    pub prompt: String,
    pub response: String,
    /// RFC 3339, UTC
    #[serde(default)]
    pub timestamp: String,
}

impl MemoryEntry {
    /// Fill in a fresh id and the current time where missing
    pub fn ensure_metadata(&mut self) {
        if self.id.trim().is_empty() {
            self.id = uuid::Uuid::now_v7().to_string();
        }
        if self.timestamp.trim().is_empty() {
            self.timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        }
    }
}

/// Storage backend for memory entries
pub trait MemoryStore: Send + Sync {
    fn save(&mut self, entry: MemoryEntry);
    fn load_all(&self) -> Vec<MemoryEntry>;
}

/// Process-lifetime store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Vec<MemoryEntry>,
}

impl MemoryStore for InMemoryStore {
    fn save(&mut self, entry: MemoryEntry) {
        self.data.push(entry);
    }

    fn load_all(&self) -> Vec<MemoryEntry> {
        self.data.clone()
    }
}

/// Plain-text listing of every entry
pub fn basic_summary(entries: &[MemoryEntry]) -> String {
    let mut out = String::from("Summarized Conversation:\n\n");
    for e in entries {
        out.push_str(&format!("Prompt: {}\nResponse: {}\n\n", e.prompt, e.response));
    }
    out
}

#[derive(Debug, Deserialize)]
struct MemoryArgs {
    history: Vec<MemoryEntry>,
}

fn validate(history: &[MemoryEntry]) -> Result<(), ToolError> {
    if history.is_empty() {
        return Err(ToolError::EmptyHistory);
    }
    for (index, entry) in history.iter().enumerate() {
        if entry.prompt.trim().is_empty() {
            return Err(ToolError::BlankEntry { index, field: "prompt" });
        }
        if entry.response.trim().is_empty() {
            return Err(ToolError::BlankEntry { index, field: "response" });
        }
    }
    Ok(())
}

/// Stores conversation history and returns a summary of all of it
pub struct MemoryTool {
    store: Mutex<Box<dyn MemoryStore>>,
}

impl MemoryTool {
    pub fn new() -> Self {
        Self::with_store(Box::new(InMemoryStore::default()))
    }

    pub fn with_store(store: Box<dyn MemoryStore>) -> Self {
        Self { store: Mutex::new(store) }
    }
}

impl Default for MemoryTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for MemoryTool {
    fn name(&self) -> &'static str {
        "summarize_memory"
    }

    fn description(&self) -> &'static str {
        "Store prompt/response pairs from this conversation and get back a summary of everything stored so far."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new().required(
            "history",
            ParamType::Array,
            "List of {prompt, response} objects; id and timestamp are optional",
        )
    }

    async fn execute(&self, input: Value, _ctx: &ToolContext) -> ToolResult {
        debug!("MemoryTool::execute: called");
        let args: MemoryArgs = match parse_args(self.name(), input) {
            Ok(args) => args,
            Err(e) => return e.into(),
        };
        if let Err(e) = validate(&args.history) {
            return e.into();
        }

        let mut store = self.store.lock().await;
        for mut entry in args.history {
            entry.ensure_metadata();
            debug!(id = %entry.id, "MemoryTool::execute: saving entry");
            store.save(entry);
        }

        ToolResult::success(basic_summary(&store.load_all()))
    }
}
