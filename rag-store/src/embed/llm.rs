//! Embedding provider backed by the shared LLM service.
//!
//! Whichever backend the embedding profile points at (Ollama or an
//! OpenAI-compatible endpoint) receives the whole batch in one request.

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, error};

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;

/// Embedder over [`LlmServiceProfiles::embed_batch`].
#[derive(Clone)]
pub struct LlmEmbedder {
    svc: Arc<LlmServiceProfiles>,
    /// Expected dimension; checked on every returned vector when set.
    dim: Option<usize>,
}

impl LlmEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: Option<usize>) -> Self {
        Self { svc, dim }
    }
}

impl EmbeddingsProvider for LlmEmbedder {
    fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>, RagError>> {
        async move {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let vectors = self.svc.embed_batch(texts).await.map_err(|e| {
                error!(batch = texts.len(), error = %e, "embedding batch failed");
                RagError::from(e)
            })?;
            check_batch(&vectors, texts.len(), self.dim)?;
            debug!(batch = texts.len(), dim = vectors.first().map(Vec::len), "batch embedded");
            Ok(vectors)
        }
        .boxed()
    }
}

/// Validates count and (optionally) dimension of a returned batch.
pub(crate) fn check_batch(vectors: &[Vec<f32>], want: usize, dim: Option<usize>) -> Result<(), RagError> {
    if vectors.len() != want {
        return Err(RagError::Embedding(format!(
            "provider returned {} vectors for {} inputs",
            vectors.len(),
            want
        )));
    }
    if let Some(dim) = dim {
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(RagError::VectorSizeMismatch {
                got: bad.len(),
                want: dim,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_mismatch_is_an_embedding_error() {
        let v = vec![vec![0.0; 3]];
        assert!(matches!(check_batch(&v, 2, None), Err(RagError::Embedding(_))));
    }

    #[test]
    fn dimension_is_enforced_when_configured() {
        let v = vec![vec![0.0; 3], vec![0.0; 4]];
        assert!(check_batch(&v, 2, None).is_ok());
        assert!(matches!(
            check_batch(&v, 2, Some(3)),
            Err(RagError::VectorSizeMismatch { got: 4, want: 3 })
        ));
    }
}
