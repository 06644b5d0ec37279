//! Embedding abstraction.
//!
//! Async is required because real providers (Ollama, OpenAI-compatible
//! endpoints) perform HTTP requests.

use futures::future::BoxFuture;

use crate::errors::RagError;

/// Batched embedding provider.
///
/// Contract: the output has the same length and order as `texts`; an empty
/// input yields an empty output without contacting the backend.
pub trait EmbeddingsProvider: Send + Sync {
    fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>, RagError>>;
}

pub mod llm;

pub use llm::LlmEmbedder;
