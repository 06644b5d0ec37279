//! Typed error for the pipeline crate.
//!
//! Generation failures are absent: they become an
//! `AnswerStatus::Error` record instead of an error value.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid configuration detected at construction time.
    #[error("config error: {0}")]
    Config(String),

    /// Errors from rag-store: embedding, retrieval, storage.
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// Errors from the LLM service while wiring providers.
    #[error("LLM error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Caller input violates a precondition (empty batch, duplicate ids, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
