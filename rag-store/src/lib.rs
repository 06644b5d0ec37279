//! Storage side of the paper assistant: chunking, PDF loading, embeddings and
//! vector index backends.
//!
//! The design is flat and splits responsibilities into focused modules:
//! - [`chunker`] cuts page text into overlapping windows with citation metadata
//! - [`loader`] turns PDF files into page records
//! - [`embed`] defines the batched [`EmbeddingsProvider`] seam
//! - [`index`] defines [`VectorIndex`] with a local file backend and Qdrant

pub mod chunker;
pub mod config;
pub mod embed;
pub mod errors;
pub mod filters;
pub mod index;
pub mod loader;
pub mod record;

pub use chunker::Chunker;
pub use config::{DistanceKind, IndexConfig, QdrantConfig};
pub use embed::{EmbeddingsProvider, LlmEmbedder};
pub use errors::RagError;
pub use index::{LocalIndex, QdrantIndex, VectorIndex, open_index};
pub use loader::{LoadedDocument, load_pdf, load_pdfs_from_dir};
pub use record::{
    Chunk, ChunkMetadata, IndexedVector, PageRecord, PageRecordMetadata, RagFilter, RagHit,
    RangeCondition,
};
