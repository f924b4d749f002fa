//! The analysis trigger: validate the upload, then call the model once.
//!
//! Each call to [`Analyzer::analyze`] is independent. Nothing about the image
//! or the answer is kept once the call returns.

use crate::config::{Config, LimitsConfig};
use crate::error::AnalysisError;
use crate::image::{self, UploadedImage};
use crate::llm::retry;
use crate::llm::{AnalysisPayload, VisionProvider};
use crate::prompts::DEFAULT_PROMPT;
use std::time::Duration;

/// One user-triggered analysis.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Prompt text, sent byte-for-byte
    pub prompt: String,
    /// The uploaded photo, if the user picked one
    pub image: Option<UploadedImage>,
}

impl AnalysisRequest {
    pub fn new(prompt: impl Into<String>, image: Option<UploadedImage>) -> Self {
        Self {
            prompt: prompt.into(),
            image,
        }
    }

    /// Request using the built-in nutrition prompt.
    pub fn with_default_prompt(image: Option<UploadedImage>) -> Self {
        Self::new(DEFAULT_PROMPT, image)
    }
}

/// Text answer for one analysis.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Model output, unmodified
    pub text: String,
    /// Model that produced it
    pub model: String,
    /// Tokens used, if reported
    pub tokens_used: Option<u32>,
    /// Latency of the successful call in milliseconds
    pub latency_ms: u64,
}

/// Knobs for a single analysis call.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Per-call timeout in milliseconds
    pub timeout_ms: u64,
    /// Extra attempts after a retryable failure
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
    /// Upload limits applied by the image adapter
    pub limits: LimitsConfig,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl AnalyzeOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout_ms: config.limits.llm_timeout_ms,
            retry_attempts: config.analysis.retry_attempts,
            retry_delay_ms: config.analysis.retry_delay_ms,
            limits: config.limits.clone(),
        }
    }
}

/// Runs analyses against one provider.
pub struct Analyzer {
    provider: Box<dyn VisionProvider>,
    options: AnalyzeOptions,
}

impl Analyzer {
    pub fn new(provider: Box<dyn VisionProvider>, options: AnalyzeOptions) -> Self {
        Self { provider, options }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn options(&self) -> &AnalyzeOptions {
        &self.options
    }

    /// Analyze one food photo.
    ///
    /// Input errors are returned before the provider is touched. With the
    /// default options exactly one backend call is made.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let images = image::prepare(request.image, &self.options.limits)?;
        if request.prompt.trim().is_empty() {
            return Err(AnalysisError::EmptyPrompt);
        }

        let payload = AnalysisPayload {
            prompt: request.prompt,
            images,
        };
        let timeout = Duration::from_millis(self.options.timeout_ms);

        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = retry::backoff_duration(attempt - 1, self.options.retry_delay_ms);
                tracing::debug!(
                    "Retry {attempt}/{} with {} after {delay:?}",
                    self.options.retry_attempts,
                    self.provider.name()
                );
                tokio::time::sleep(delay).await;
            }

            let outcome = match tokio::time::timeout(timeout, self.provider.generate(&payload)).await
            {
                Ok(result) => result,
                Err(_) => Err(AnalysisError::Timeout {
                    timeout_ms: self.options.timeout_ms,
                }),
            };

            match outcome {
                Ok(response) => {
                    tracing::info!(
                        provider = self.provider.name(),
                        model = %response.model,
                        latency_ms = response.latency_ms,
                        tokens = ?response.tokens_used,
                        "Analysis complete"
                    );
                    return Ok(AnalysisResult {
                        text: response.text,
                        model: response.model,
                        tokens_used: response.tokens_used,
                        latency_ms: response.latency_ms,
                    });
                }
                Err(e) => {
                    if attempt >= self.options.retry_attempts || !retry::is_retryable(&e) {
                        return Err(e);
                    }
                    tracing::warn!("Transient analysis failure: {e}");
                }
            }
            attempt += 1;
        }
    }
}
