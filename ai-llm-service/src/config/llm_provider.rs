use std::str::FromStr;

use crate::error_handler::{AiLlmError, ConfigError};

/// Represents the provider (backend) used for generation or embeddings.
///
/// `OpenAI` covers any OpenAI-compatible REST endpoint (OpenAI itself,
/// vLLM, LM Studio, llama.cpp server, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
    /// OpenAI or an OpenAI-compatible HTTP API.
    OpenAI,
}

impl LlmProvider {
    /// Endpoint used when none is configured.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "http://localhost:11434",
            LlmProvider::OpenAI => "https://api.openai.com",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = AiLlmError;

    /// Parses `LLM_KIND`-style values (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "openai" | "chatgpt" | "openai-compatible" => Ok(LlmProvider::OpenAI),
            other => Err(ConfigError::UnsupportedProvider(other.to_string()).into()),
        }
    }
}
