//! CalorAI Core - food photo nutrition analysis library.
//!
//! Takes a photo of a meal and a prompt, sends both to a hosted multimodal
//! model, and returns the model's free-text answer.
//!
//! # Architecture
//!
//! ```text
//! UploadedImage → image::prepare → AnalysisPayload → VisionProvider (Gemini) → text
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use calorai_core::{AnalysisRequest, Analyzer, AnalyzeOptions, Config, ProviderFactory, UploadedImage};
//!
//! #[tokio::main]
//! async fn main() -> calorai_core::Result<()> {
//!     let config = Config::load()?;
//!     let provider = ProviderFactory::create(&config.llm, None)?;
//!     let analyzer = Analyzer::new(provider, AnalyzeOptions::from_config(&config));
//!
//!     let image = UploadedImage::from_path("./lunch.jpg".as_ref()).await?;
//!     let result = analyzer.analyze(AnalysisRequest::with_default_prompt(Some(image))).await?;
//!     println!("{}", result.text);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod analyzer;
pub mod config;
pub mod error;
pub mod image;
pub mod llm;
pub mod prompts;

// Re-exports for convenient access
pub use analyzer::{AnalysisRequest, AnalysisResult, AnalyzeOptions, Analyzer};
pub use config::Config;
pub use error::{AnalysisError, CalorError, ConfigError, Result};
pub use image::{ImageMediaType, ImagePart, UploadedImage};
pub use llm::{AnalysisPayload, LlmResponse, ProviderFactory, VisionProvider};
pub use prompts::DEFAULT_PROMPT;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
