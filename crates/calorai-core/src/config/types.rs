//! Sub-configuration structs with their defaults.

use crate::prompts::DEFAULT_PROMPT;
use serde::{Deserialize, Serialize};

/// Web server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the form is served on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8501".to_string(),
        }
    }
}

/// Analysis behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Prompt prefilled in the form and used by `calorai analyze`
    pub prompt: String,

    /// Extra attempts for transient backend failures (0 = single call)
    pub retry_attempts: u32,

    /// Base delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            retry_attempts: 0,
            retry_delay_ms: 1000,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes
    pub max_file_size_mb: u64,

    /// LLM call timeout in milliseconds
    pub llm_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            // Gemini rejects inline payloads above 20MB
            max_file_size_mb: 20,
            llm_timeout_ms: 60_000,
        }
    }
}

impl LimitsConfig {
    /// Upload limit in bytes.
    pub fn max_file_size_bytes(&self) -> usize {
        (self.max_file_size_mb as usize).saturating_mul(1024 * 1024)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LlmConfig {
    /// Google Gemini configuration
    pub gemini: GeminiConfig,
}

/// Gemini configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// Base URL of the Generative Language API
    pub endpoint: String,

    /// Sampling temperature; backend default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Output token cap; backend default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: "${GOOGLE_API_KEY}".to_string(),
            model: "gemini-1.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}
