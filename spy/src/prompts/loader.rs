//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::tools::{Tool, ToolRegistry};

/// One parameter as listed in the system prompt
#[derive(Debug, Clone, Serialize)]
pub struct ParameterSummary {
    pub name: String,
    pub kind: String,
    pub description: String,
    pub required: bool,
}

/// One tool as listed in the system prompt
#[derive(Debug, Clone, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSummary>,
}

impl ToolSummary {
    fn from_tool(tool: &dyn Tool) -> Self {
        let schema = tool.parameters();
        let parameters = schema
            .properties
            .iter()
            .map(|p| ParameterSummary {
                name: p.name.clone(),
                kind: serde_json::to_value(p.kind)
                    .ok()
                    .and_then(|v| v.as_str().map(String::from))
                    .unwrap_or_default(),
                description: p.description.clone(),
                required: schema.required.contains(&p.name),
            })
            .collect();

        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters,
        }
    }
}

/// Context for rendering the system prompt
#[derive(Debug, Clone, Serialize)]
pub struct SystemPromptContext {
    pub tools: Vec<ToolSummary>,
    pub step_budget: u32,
    pub working_dir: Option<String>,
}

impl SystemPromptContext {
    pub fn new(registry: &ToolRegistry, step_budget: u32, working_dir: Option<&Path>) -> Self {
        debug!(tools = registry.len(), %step_budget, "SystemPromptContext::new: called");
        Self {
            tools: registry.iter().map(ToolSummary::from_tool).collect(),
            step_budget,
            working_dir: working_dir.map(|d| d.display().to_string()),
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    /// Override directory (`<working dir>/.spyagent/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that honors overrides under `<dir>/.spyagent/prompts/`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let user_dir = dir.as_ref().join(".spyagent").join("prompts");
        let user_dir_exists = user_dir.exists();
        debug!(?user_dir, %user_dir_exists, "PromptLoader::new: checking directory");

        Self {
            hbs: Self::engine(),
            user_dir: user_dir_exists.then_some(user_dir),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks `<user_dir>/{name}.pmt` first, then the embedded fallback.
    fn load_template(&self, name: &str) -> Result<String> {
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: using override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render the system prompt
    pub fn render_system(&self, context: &SystemPromptContext) -> Result<String> {
        let template = self.load_template("system")?;
        info!(tools = context.tools.len(), "Rendering system prompt");

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template system: {}", e))
    }
}

/// System prompt from the embedded template
pub fn default_system_prompt(registry: &ToolRegistry, step_budget: u32, working_dir: Option<&Path>) -> Result<String> {
    PromptLoader::embedded_only().render_system(&SystemPromptContext::new(registry, step_budget, working_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_render_lists_every_tool() {
        let registry = ToolRegistry::standard();
        let prompt = default_system_prompt(&registry, 7, None).unwrap();

        for name in registry.names() {
            assert!(prompt.contains(&format!("### {}", name)), "missing {name}");
        }
        assert!(prompt.contains("at most 7 steps"));
        assert!(prompt.contains("`command` (string, required)"));
        assert!(!prompt.contains("Commands run in"));
    }

    #[test]
    fn test_render_does_not_escape() {
        let registry = ToolRegistry::standard();
        let prompt = default_system_prompt(&registry, 5, Some(Path::new("/tmp/a&b"))).unwrap();
        assert!(prompt.contains("`/tmp/a&b`"));
        assert!(prompt.contains("{\"name\": \"<tool name>\""));
    }

    #[test]
    fn test_override_file_wins() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(".spyagent").join("prompts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("system.pmt"), "Custom with {{step_budget}} steps").unwrap();

        let loader = PromptLoader::new(temp.path());
        let ctx = SystemPromptContext::new(&ToolRegistry::new(), 3, None);
        assert_eq!(loader.render_system(&ctx).unwrap(), "Custom with 3 steps");
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent").is_err());
    }
}
