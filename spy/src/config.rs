//! SpyAgent configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default number of query/dispatch iterations per run
pub const DEFAULT_STEP_BUDGET: u32 = 5;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Main SpyAgent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Step loop configuration
    pub agent: AgentConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Fails fast when the selected provider needs an API key and the
    /// environment variable holding it is unset.
    pub fn validate(&self) -> Result<()> {
        if self.llm.requires_api_key() && self.llm.api_key().is_none() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        if self.agent.step_budget == 0 {
            return Err(eyre::eyre!("agent.step-budget must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .spyagent.yml
        let local_config = PathBuf::from(".spyagent.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/spyagent/spyagent.yml
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are ignored here; the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates: Vec<PathBuf> = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".spyagent.yml")];
                paths.extend(user_config_path());
                paths
            }
        };

        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    pub(crate) fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("spyagent").join("spyagent.yml"))
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("openai" or "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL (without the /v1 suffix); the provider's default when unset
    #[serde(rename = "base-url", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: None,
            max_tokens: 4096,
            timeout_ms: 300_000,
        }
    }
}

impl LlmConfig {
    /// Base URL to send requests to
    pub fn base_url(&self) -> &str {
        match (&self.base_url, self.provider.as_str()) {
            (Some(url), _) => url,
            (None, "ollama") => OLLAMA_BASE_URL,
            (None, _) => OPENAI_BASE_URL,
        }
    }

    /// Local providers run without credentials
    pub fn requires_api_key(&self) -> bool {
        self.provider != "ollama"
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        debug!(env = %self.api_key_env, "LlmConfig::api_key: called");
        std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty())
    }
}

/// Step loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum iterations per run
    #[serde(rename = "step-budget")]
    pub step_budget: u32,

    /// Working directory for the bash tool (process cwd when unset)
    #[serde(rename = "working-dir")]
    pub working_dir: Option<PathBuf>,

    /// Upper bound on a single bash command; unbounded when unset
    #[serde(rename = "command-timeout-ms")]
    pub command_timeout_ms: Option<u64>,

    /// Directory for per-session JSONL logs
    #[serde(rename = "runs-dir")]
    pub runs_dir: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/spyagent/runs on Linux)
        let runs_dir = dirs::data_local_dir()
            .map(|d| d.join("spyagent").join("runs"))
            .unwrap_or_else(|| PathBuf::from(".spyagent/runs"));

        Self {
            step_budget: DEFAULT_STEP_BUDGET,
            working_dir: None,
            command_timeout_ms: None,
            runs_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.agent.step_budget, 5);
        assert!(config.agent.working_dir.is_none());
        assert!(config.agent.command_timeout_ms.is_none());
    }

    #[test]
    fn test_load_from_file_partial_yaml() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("spyagent.yml");
        fs::write(
            &path,
            "log-level: debug\nllm:\n  provider: ollama\n  model: qwen2.5\nagent:\n  step-budget: 9\n  working-dir: /tmp\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model, "qwen2.5");
        // Unspecified keys keep their defaults
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.agent.step_budget, 9);
        assert_eq!(config.agent.working_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(config.llm.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_base_url_follows_provider_unless_set() {
        assert_eq!(LlmConfig::default().base_url(), "https://api.openai.com");

        let temp = tempdir().unwrap();
        let path = temp.path().join("spyagent.yml");
        fs::write(&path, "llm:\n  provider: ollama\n  base-url: http://gpu-box:11434/\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.llm.base_url(), "http://gpu-box:11434/");
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nope.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_log_level_explicit() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("spyagent.yml");
        fs::write(&path, "log-level: trace\n").unwrap();
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("trace"));
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = Config::default();
        config.llm.provider = "ollama".to_string();
        config.agent.step_budget = 0;
        assert!(config.validate().is_err());

        config.agent.step_budget = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ollama_does_not_require_key() {
        let ollama = LlmConfig {
            provider: "ollama".to_string(),
            ..LlmConfig::default()
        };
        assert!(!ollama.requires_api_key());
        assert!(LlmConfig::default().requires_api_key());
    }
}
