//! ToolRegistry - name-keyed, registration-ordered tool set

use std::collections::HashMap;
use tracing::{debug, info};

use super::builtin::{BashTool, DoneTool, MemoryTool, ModifierTool, ThinkingTool};
use super::error::ToolError;
use super::traits::Tool;
use crate::llm::ToolDefinition;

/// Tools available to an agent session
///
/// Names are unique; iteration and `definitions()` follow registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        debug!("ToolRegistry::new: called");
        Self::default()
    }

    /// Create a registry with every built-in tool
    pub fn standard() -> Self {
        debug!("ToolRegistry::standard: called");
        let builtins: Vec<Box<dyn Tool>> = vec![
            Box::new(ThinkingTool),
            Box::new(BashTool),
            Box::new(ModifierTool),
            Box::new(MemoryTool::new()),
            Box::new(DoneTool),
        ];

        let mut registry = Self::new();
        for tool in builtins {
            if let Err(e) = registry.register(tool) {
                tracing::warn!(%e, "ToolRegistry::standard: skipping built-in");
            }
        }
        info!(count = registry.len(), "Registered built-in tools");
        registry
    }

    /// Add a tool; the registry is unchanged if the name is taken
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name();
        debug!(%name, "ToolRegistry::register: called");
        if self.index.contains_key(name) {
            debug!(%name, "ToolRegistry::register: duplicate name");
            return Err(ToolError::DuplicateTool { name: name.to_string() });
        }
        self.index.insert(name.to_string(), self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn Tool> {
        debug!(%name, "ToolRegistry::lookup: called");
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Wire schemas for every tool, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        debug!(count = self.tools.len(), "ToolRegistry::definitions: called");
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.iter().map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ParameterSchema, ToolContext, ToolResult};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use serde_json::Value;

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &'static str {
            self.0
        }

        fn description(&self) -> &'static str {
            "test tool"
        }

        fn parameters(&self) -> ParameterSchema {
            ParameterSchema::new()
        }

        async fn execute(&self, _input: Value, _ctx: &ToolContext) -> ToolResult {
            ToolResult::success(self.0)
        }
    }

    #[test]
    fn test_standard_order() {
        let registry = ToolRegistry::standard();
        assert_eq!(
            registry.names(),
            vec!["thinking", "bash", "modifier", "summarize_memory", "done"]
        );
        assert!(registry.lookup("done").unwrap().is_terminal());
        assert!(!registry.lookup("bash").unwrap().is_terminal());
    }

    #[test]
    fn test_definitions_follow_registration() {
        let registry = ToolRegistry::standard();
        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, registry.names());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(NamedTool("a"))).unwrap();

        let err = registry.register(Box::new(NamedTool("a"))).unwrap_err();
        assert!(matches!(err, ToolError::DuplicateTool { ref name } if name == "a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_missing() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.lookup("bash").is_none());
        assert!(!registry.contains("bash"));
    }

    proptest! {
        #[test]
        fn prop_duplicate_leaves_registry_unchanged(
            names in proptest::collection::hash_set("[a-z_]{1,12}", 1..8),
            pick in any::<prop::sample::Index>(),
        ) {
            let names: Vec<&'static str> = names
                .into_iter()
                .map(|n| &*Box::leak(n.into_boxed_str()))
                .collect();

            let mut registry = ToolRegistry::new();
            for name in &names {
                registry.register(Box::new(NamedTool(name))).unwrap();
            }
            let before = registry.names();

            let dup = names[pick.index(names.len())];
            prop_assert!(registry.register(Box::new(NamedTool(dup))).is_err());
            prop_assert_eq!(registry.names(), before);
            prop_assert_eq!(registry.len(), names.len());
        }
    }
}
