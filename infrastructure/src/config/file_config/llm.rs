//! Model server configuration from TOML (`[llm]` section)

use serde::{Deserialize, Serialize};

/// Where models are served and which one agents use by default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLlmConfig {
    /// Base URL of the Ollama server
    pub endpoint: String,
    /// Model for agents without a model hint
    pub default_model: String,
    /// Upper bound for one whole generation, streaming included
    pub request_timeout_seconds: Option<u64>,
}

impl Default for FileLlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            default_model: "gemma3:4b-it-qat".to_string(),
            request_timeout_seconds: Some(300),
        }
    }
}
