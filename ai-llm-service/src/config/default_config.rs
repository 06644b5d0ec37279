//! LLM configs loaded from environment variables.
//!
//! Two roles are supported:
//!
//! - **Generation** → the model that writes grounded answers
//! - **Embedding**  → the model that maps text to vectors
//!
//! Each role may use a different provider, so a local Ollama embedder can be
//! paired with a remote OpenAI-compatible generator (or vice versa).
//!
//! # Environment variables
//!
//! Generation:
//! - `LLM_KIND`         = `ollama` | `openai` (default `ollama`)
//! - `LLM_MODEL`        = model id (mandatory)
//! - `LLM_ENDPOINT`     = base URL (optional; see [`resolve_endpoint`])
//! - `LLM_API_KEY`      = API key (falls back to `OPENAI_API_KEY`)
//! - `LLM_TEMPERATURE`  = optional f32 in `0.0..=2.0` (default 0.2)
//! - `LLM_MAX_TOKENS`   = optional u32
//! - `LLM_TIMEOUT_SECS` = optional u64 (default 120)
//!
//! Embedding:
//! - `EMBEDDING_KIND`         = provider (defaults to `LLM_KIND`)
//! - `EMBEDDING_MODEL`        = model id (mandatory)
//! - `EMBEDDING_ENDPOINT`     = base URL (optional)
//! - `EMBEDDING_TIMEOUT_SECS` = optional u64 (default 60)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{Result, env_opt_f32, env_opt_string, env_opt_u32, env_opt_u64, must_env},
};

/// Default ceiling for a single generation call.
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;

/// Default ceiling for a single embedding batch.
pub const DEFAULT_EMBEDDING_TIMEOUT_SECS: u64 = 60;

/// Resolves an endpoint for `provider`.
///
/// Precedence:
/// 1. the role-specific variable (`explicit_var`) if present and non-empty
/// 2. `OLLAMA_URL` for Ollama
/// 3. the provider's built-in default
fn resolve_endpoint(provider: LlmProvider, explicit_var: &'static str) -> Option<String> {
    env_opt_string(explicit_var)
        .or_else(|| match provider {
            LlmProvider::Ollama => env_opt_string("OLLAMA_URL"),
            LlmProvider::OpenAI => None,
        })
        .or_else(|| Some(provider.default_endpoint().to_string()))
}

fn provider_from_env(var: &'static str, fallback: LlmProvider) -> Result<LlmProvider> {
    match env_opt_string(var) {
        Some(v) => v.parse(),
        None => Ok(fallback),
    }
}

fn api_key_from_env() -> Option<String> {
    env_opt_string("LLM_API_KEY").or_else(|| env_opt_string("OPENAI_API_KEY"))
}

/// Constructs the **generation** profile.
///
/// # Errors
/// Missing `LLM_MODEL`, unparsable numbers, unsupported `LLM_KIND`, or a config
/// that fails [`LlmModelConfig::validate`].
pub fn config_generation_from_env() -> Result<LlmModelConfig> {
    let provider = provider_from_env("LLM_KIND", LlmProvider::Ollama)?;
    let model = must_env("LLM_MODEL")?;
    let endpoint = resolve_endpoint(provider, "LLM_ENDPOINT").unwrap_or_default();

    let cfg = LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key: api_key_from_env(),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(env_opt_f32("LLM_TEMPERATURE")?.unwrap_or(0.2)),
        top_p: None,
        timeout_secs: Some(
            env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_GENERATION_TIMEOUT_SECS),
        ),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Constructs the **embedding** profile.
///
/// The provider defaults to the generation provider so a single `LLM_KIND`
/// covers the common single-backend setup.
pub fn config_embedding_from_env() -> Result<LlmModelConfig> {
    let generation_kind = provider_from_env("LLM_KIND", LlmProvider::Ollama)?;
    let provider = provider_from_env("EMBEDDING_KIND", generation_kind)?;
    let model = must_env("EMBEDDING_MODEL")?;
    let endpoint = resolve_endpoint(provider, "EMBEDDING_ENDPOINT").unwrap_or_default();

    let cfg = LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key: api_key_from_env(),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(
            env_opt_u64("EMBEDDING_TIMEOUT_SECS")?.unwrap_or(DEFAULT_EMBEDDING_TIMEOUT_SECS),
        ),
    };
    cfg.validate()?;
    Ok(cfg)
}
