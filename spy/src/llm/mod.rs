//! LLM Client module for SpyAgent
//!
//! Provides the completion trait the step loop talks to and the
//! OpenAI-compatible implementation used by the binary.

use tracing::debug;

pub mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
#[cfg(test)]
pub use client::mock;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, TokenUsage, ToolDefinition};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// Supports "openai" and "ollama"; both speak the Chat Completions protocol.
/// The returned box is owned by exactly one agent session.
pub fn create_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "openai" | "ollama" => {
            debug!("create_client: creating OpenAI-compatible client");
            Ok(Box::new(OpenAIClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::InvalidResponse(format!(
                "Unknown LLM provider: '{}'. Supported: openai, ollama",
                other
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_unknown_provider() {
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..LlmConfig::default()
        };
        let err = create_client(&config).err().unwrap();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn test_create_client_ollama_needs_no_key() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            api_key_env: "SPYAGENT_UNSET_TEST_KEY".to_string(),
            ..LlmConfig::default()
        };
        assert!(create_client(&config).is_ok());
    }
}
