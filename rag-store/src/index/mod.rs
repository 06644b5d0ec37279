//! Vector index abstraction and backends.
//!
//! Both backends share the same contract:
//! - `upsert` replaces entries with an existing id (no duplicates)
//! - `query` returns at most `top_k` hits, closest first; an empty index yields `[]`
//! - `clear` deletes the store and recreates it empty

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::info;

use crate::config::IndexConfig;
use crate::errors::RagError;
use crate::record::{IndexedVector, RagFilter, RagHit};

pub mod local;
pub mod qdrant;

pub use local::LocalIndex;
pub use qdrant::QdrantIndex;

/// Durable store of `(id, vector, text, metadata)` with similarity search.
pub trait VectorIndex: Send + Sync {
    /// Inserts or replaces entries; returns how many were written.
    fn upsert(&self, items: Vec<IndexedVector>) -> BoxFuture<'_, Result<usize, RagError>>;

    fn query<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: usize,
        filter: Option<&'a RagFilter>,
    ) -> BoxFuture<'a, Result<Vec<RagHit>, RagError>>;

    fn count(&self) -> BoxFuture<'_, Result<usize, RagError>>;

    fn clear(&self) -> BoxFuture<'_, Result<(), RagError>>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

/// Opens the configured backend.
///
/// # Errors
/// [`RagError::Config`] for invalid settings or an unusable storage path.
pub async fn open_index(cfg: &IndexConfig) -> Result<Arc<dyn VectorIndex>, RagError> {
    cfg.validate()?;
    let index: Arc<dyn VectorIndex> = match cfg {
        IndexConfig::Local { path } => Arc::new(LocalIndex::open(path).await?),
        IndexConfig::Qdrant(q) => Arc::new(QdrantIndex::new(q)?),
    };
    info!(backend = index.backend(), "vector index opened");
    Ok(index)
}

/// Checks that every vector in a batch has the same non-zero dimension.
pub(crate) fn batch_dimension(items: &[IndexedVector]) -> Result<usize, RagError> {
    let want = items.first().map(|i| i.embedding.len()).unwrap_or(0);
    if want == 0 {
        return Err(RagError::InvalidInput("empty embedding vector".into()));
    }
    match items.iter().find(|i| i.embedding.len() != want) {
        Some(bad) => Err(RagError::VectorSizeMismatch {
            got: bad.embedding.len(),
            want,
        }),
        None => Ok(want),
    }
}
