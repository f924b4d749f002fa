//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "server.bind is not a socket address: {}",
                self.server.bind
            )));
        }
        if self.analysis.prompt.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "analysis.prompt must not be empty".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.llm_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.llm_timeout_ms must be > 0".into(),
            ));
        }
        if self.llm.gemini.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.gemini.model must not be empty".into(),
            ));
        }
        if self.llm.gemini.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.gemini.endpoint must not be empty".into(),
            ));
        }
        if let Some(t) = self.llm.gemini.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "llm.gemini.temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }
        Ok(())
    }
}
