use std::time::Duration;

use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{Result, validate_http_endpoint, validate_range_f32, ConfigError};

/// Request ceiling applied when a profile leaves `timeout_secs` unset.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Configuration for one LLM model invocation profile.
///
/// The same struct describes both generator and embedding models; fields that
/// do not apply to a role (e.g. `temperature` for embeddings) are simply ignored
/// by the provider.
///
/// # Examples
///
/// ```
/// use ai_llm_service::llm::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Ollama,
///     model: "llama3.1:8b".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     api_key: None,
///     max_tokens: Some(512),
///     temperature: Some(0.2),
///     top_p: None,
///     timeout_secs: Some(120),
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"gpt-4o-mini"`, `"nomic-embed-text"`).
    pub model: String,

    /// Inference endpoint base URL (without the `/api/...` or `/v1/...` suffix).
    pub endpoint: String,

    /// Optional API key for authentication (OpenAI-compatible endpoints).
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Request timeout in seconds. `None` means [`DEFAULT_REQUEST_TIMEOUT_SECS`].
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Checks the invariants every provider relies on.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyModel`] for a blank model name
    /// - [`ConfigError::InvalidFormat`] for a non-http(s) endpoint
    /// - [`ConfigError::OutOfRange`] for temperature outside `0.0..=2.0` or top_p outside `0.0..=1.0`
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("endpoint", self.endpoint.trim())?;
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::OutOfRange {
                field: "timeout_secs",
                detail: "expected a value > 0",
            }
            .into());
        }
        Ok(())
    }

    /// Ceiling for one request to this profile's provider. Shared by the HTTP
    /// clients and by callers that add their own deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(timeout_secs: Option<u64>) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "m".into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs,
        }
    }

    #[test]
    fn unset_timeout_falls_back_to_the_shared_default() {
        assert_eq!(cfg(None).request_timeout(), Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
        assert_eq!(cfg(Some(7)).request_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(cfg(Some(0)).validate().is_err());
        assert!(cfg(None).validate().is_ok());
    }
}
