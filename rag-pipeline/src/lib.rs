//! Retrieval-augmented question answering over indexed papers.
//!
//! Public API: [`RagPipeline`]. Indexing embeds chunk texts in one batch and
//! upserts them into a [`rag_store::VectorIndex`]. Answering embeds the
//! question, retrieves top-K chunks (optionally filtered), assembles a cited
//! context closest-first, asks the generator, and returns an [`AnswerRecord`]
//! whose citations line up with the source snippets.
//!
//! # Example
//! ```no_run
//! # use std::sync::Arc;
//! # use ai_llm_service::{LlmServiceProfiles, config::default_config::*};
//! # use rag_pipeline::{PipelineConfig, RagPipeline};
//! # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::new(
//!     config_generation_from_env()?,
//!     config_embedding_from_env()?,
//!     None,
//! )?);
//! let pipeline = RagPipeline::from_config(&PipelineConfig::from_env()?, svc).await?;
//! let rec = pipeline.answer("What is the main contribution?", None).await?;
//! println!("{} ({} sources)", rec.answer_text, rec.retrieved_count);
//! # Ok(()) }
//! ```

mod api_types;
mod cfg;
mod error;
mod pipeline;

pub mod evaluation;
pub mod generator;
pub mod prompt;

pub use api_types::{AnswerRecord, AnswerStatus, Citation};
pub use cfg::PipelineConfig;
pub use error::PipelineError;
pub use evaluation::{QaLogEntry, append_qa_log, qualitative_feedback_template};
pub use generator::{AnswerGenerator, GenerationOutcome, LlmGenerator};
pub use pipeline::{PipelineSettings, RagPipeline};
