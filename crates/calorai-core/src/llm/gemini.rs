//! Google Gemini provider using the `generateContent` REST API.
//!
//! Sends the prompt followed by base64 inline image data in a single user turn.

use super::provider::{AnalysisPayload, LlmResponse, VisionProvider};
use crate::error::AnalysisError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Everything the Gemini client needs, passed in explicitly.
#[derive(Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    /// Base URL, e.g. `https://generativelanguage.googleapis.com/v1beta`
    pub endpoint: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl std::fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

/// Gemini provider.
pub struct GeminiProvider {
    settings: GeminiSettings,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(settings: GeminiSettings) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AnalysisError::Network {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            settings: GeminiSettings {
                endpoint: settings.endpoint.trim_end_matches('/').to_string(),
                ..settings
            },
            client,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint, self.settings.model
        )
    }

    fn build_request(&self, payload: &AnalysisPayload) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(payload.images.len() + 1);
        parts.push(Part::Text {
            text: payload.prompt.clone(),
        });
        parts.extend(payload.images.iter().map(|image| Part::InlineData {
            inline_data: InlineData {
                mime_type: image.media_type.clone(),
                data: image.base64(),
            },
        }));

        let generation_config =
            if self.settings.temperature.is_some() || self.settings.max_output_tokens.is_some() {
                Some(GenerationConfig {
                    temperature: self.settings.temperature,
                    max_output_tokens: self.settings.max_output_tokens,
                })
            } else {
                None
            };

        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config,
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Reduce a successful response body to its text.
fn extract_text(
    resp: GenerateContentResponse,
) -> Result<(String, Option<u32>, Option<String>), AnalysisError> {
    let tokens = resp.usage_metadata.and_then(|u| u.total_token_count);

    let Some(candidate) = resp.candidates.into_iter().next() else {
        let reason = resp
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(AnalysisError::Backend {
            message: format!("Gemini returned no answer: {reason}"),
            status_code: None,
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(AnalysisError::Backend {
            message: format!("Gemini returned empty response (finish reason: {reason})"),
            status_code: None,
        });
    }

    Ok((text, tokens, resp.model_version))
}

/// Map a non-success HTTP response to an error kind.
fn classify_error(status: u16, body: &str) -> AnalysisError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| body.trim().to_string());
    let message = format!("Gemini HTTP {status}: {message}");

    // An invalid key comes back as 400 INVALID_ARGUMENT, not 401
    let bad_key = body.contains("API_KEY_INVALID")
        || parsed
            .as_ref()
            .and_then(|e| e.error.status.as_deref())
            .is_some_and(|s| s == "UNAUTHENTICATED" || s == "PERMISSION_DENIED");

    if status == 401 || status == 403 || bad_key {
        AnalysisError::Auth {
            message,
            status_code: Some(status),
        }
    } else {
        AnalysisError::Backend {
            message,
            status_code: Some(status),
        }
    }
}

#[async_trait]
impl VisionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, payload: &AnalysisPayload) -> Result<LlmResponse, AnalysisError> {
        let start = Instant::now();
        let body = self.build_request(payload);

        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Network {
                message: format!("Gemini request failed: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &text));
        }

        let parsed: GenerateContentResponse =
            resp.json().await.map_err(|e| AnalysisError::Backend {
                message: format!("Failed to parse Gemini response: {e}"),
                status_code: Some(status.as_u16()),
            })?;

        let (text, tokens_used, model_version) = extract_text(parsed)?;

        Ok(LlmResponse {
            text,
            model: model_version.unwrap_or_else(|| self.settings.model.clone()),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
