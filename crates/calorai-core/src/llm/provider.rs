//! Vision provider trait and request/response types.
//!
//! Defines the interface the analyzer talks to, plus the factory that builds
//! the configured provider.

use crate::config::LlmConfig;
use crate::error::AnalysisError;
use crate::image::ImagePart;
use async_trait::async_trait;

use super::gemini::{GeminiProvider, GeminiSettings};

/// Prompt plus image entries for a single multimodal call.
#[derive(Debug, Clone)]
pub struct AnalysisPayload {
    /// Text prompt, sent verbatim
    pub prompt: String,
    /// Image entries as produced by [`crate::image::prepare`]
    pub images: Vec<ImagePart>,
}

/// The response from one generation call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text, unmodified
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that every hosted model backend implements.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the analyzer holds a `Box<dyn VisionProvider>`).
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name for logging (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Send the prompt and images, returning the model's text.
    async fn generate(&self, payload: &AnalysisPayload) -> Result<LlmResponse, AnalysisError>;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Builds the configured provider.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the Gemini provider from config.
    ///
    /// # Arguments
    /// * `config` - The LLM config section
    /// * `model_override` - Optional model name that overrides the config default
    pub fn create(
        config: &LlmConfig,
        model_override: Option<&str>,
    ) -> Result<Box<dyn VisionProvider>, AnalysisError> {
        let cfg = &config.gemini;
        let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| AnalysisError::Auth {
            message: "Gemini API key not set. Set GOOGLE_API_KEY env var.".to_string(),
            status_code: None,
        })?;
        let model = model_override
            .map(String::from)
            .unwrap_or_else(|| cfg.model.clone());

        let provider = GeminiProvider::new(GeminiSettings {
            api_key,
            model,
            endpoint: cfg.endpoint.clone(),
            temperature: cfg.temperature,
            max_output_tokens: cfg.max_output_tokens,
        })?;
        Ok(Box::new(provider))
    }
}
