//! Error types for CalorAI.
//!
//! Input problems (nothing to send, or something we refuse to send) are kept
//! apart from failures of the remote analysis itself, so callers can show a
//! warning for the former and an error for the latter.

use thiserror::Error;

/// Top-level error type for CalorAI operations.
#[derive(Error, Debug)]
pub enum CalorError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Analysis errors (input validation or backend failure)
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors produced while preparing or running one analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// No image was supplied, or the uploaded file is empty
    #[error("No image uploaded")]
    MissingImage,

    /// The prompt is empty or whitespace only
    #[error("Prompt must not be empty")]
    EmptyPrompt,

    /// Declared media type is not one we accept
    #[error("Unsupported media type: {media_type} (expected image/jpeg or image/png)")]
    UnsupportedMediaType { media_type: String },

    /// Bytes do not look like the declared image format
    #[error("Invalid image: {message}")]
    InvalidImage { message: String },

    /// Upload exceeds the configured size limit
    #[error("Image too large: {size_bytes} bytes (limit {max_mb}MB)")]
    ImageTooLarge { size_bytes: usize, max_mb: u64 },

    /// Credential missing or rejected by the backend
    #[error("Authentication failed: {message}")]
    Auth {
        message: String,
        status_code: Option<u16>,
    },

    /// Transport-level failure (DNS, connect, TLS, reset)
    #[error("Network error: {message}")]
    Network { message: String },

    /// Backend answered with an error status or an unusable body
    #[error("Backend error: {message}")]
    Backend {
        message: String,
        status_code: Option<u16>,
    },

    /// No answer within the configured timeout
    #[error("Analysis timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl AnalysisError {
    /// True for problems with what the user submitted. These never reach the
    /// backend and are shown as warnings rather than errors.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MissingImage
                | Self::EmptyPrompt
                | Self::UnsupportedMediaType { .. }
                | Self::InvalidImage { .. }
                | Self::ImageTooLarge { .. }
        )
    }

    /// HTTP status reported by the backend, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Auth { status_code, .. } | Self::Backend { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

/// Convenience type alias for CalorAI results.
pub type Result<T> = std::result::Result<T, CalorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_classified() {
        assert!(AnalysisError::MissingImage.is_input_error());
        assert!(AnalysisError::EmptyPrompt.is_input_error());
        assert!(AnalysisError::UnsupportedMediaType {
            media_type: "image/gif".into()
        }
        .is_input_error());
    }

    #[test]
    fn test_backend_failures_not_input_errors() {
        let auth = AnalysisError::Auth {
            message: "API key not valid".into(),
            status_code: Some(400),
        };
        assert!(!auth.is_input_error());
        assert_eq!(auth.status_code(), Some(400));
        assert!(!AnalysisError::Timeout { timeout_ms: 10 }.is_input_error());
        assert!(!AnalysisError::Network {
            message: "connection refused".into()
        }
        .is_input_error());
    }

    #[test]
    fn test_error_messages_carry_underlying_message() {
        let err = AnalysisError::Backend {
            message: "Gemini HTTP 500: internal".into(),
            status_code: Some(500),
        };
        assert_eq!(err.to_string(), "Backend error: Gemini HTTP 500: internal");
    }
}
