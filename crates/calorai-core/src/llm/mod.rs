//! Multimodal model integration.
//!
//! Provides a provider abstraction over the hosted vision model plus the
//! Gemini implementation and the retry helpers the analyzer uses.

pub(crate) mod gemini;
pub(crate) mod provider;
pub(crate) mod retry;

pub use gemini::{GeminiProvider, GeminiSettings};
pub use provider::{resolve_env_var, AnalysisPayload, LlmResponse, ProviderFactory, VisionProvider};
