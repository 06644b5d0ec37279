//! Provider-agnostic LLM access for the paper assistant.
//!
//! The crate wraps two kinds of backends behind one configuration type
//! ([`LlmModelConfig`]):
//! - **Ollama** (local runtime, `/api/chat` and `/api/embed`)
//! - **OpenAI-compatible** endpoints (`/v1/chat/completions`, `/v1/embeddings`)
//!
//! Consumers usually construct a single [`LlmServiceProfiles`] at process start,
//! wrap it in `Arc`, and hand clones to whoever needs generation or embeddings.

pub mod chat;
pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

/// Short alias module so downstream code can write `ai_llm_service::llm::LlmModelConfig`.
pub mod llm {
    pub use crate::config::llm_model_config::LlmModelConfig;
    pub use crate::config::llm_provider::LlmProvider;
}

pub use chat::{ChatRole, ChatTurn};
pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, Result};
pub use health_service::{HealthService, HealthStatus};
pub use service_profiles::LlmServiceProfiles;
