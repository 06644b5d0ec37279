//! File-backed vector index.
//!
//! The whole index lives in `<path>/index.json`, loaded into memory on open.
//! Writes build a new snapshot, persist it through a temp file + rename, and
//! only then swap it in, so a failed write leaves both disk and memory intact.
//! Search is brute-force cosine similarity.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::errors::RagError;
use crate::filters;
use crate::index::{VectorIndex, batch_dimension};
use crate::record::{IndexedVector, RagFilter, RagHit};

const INDEX_FILE: &str = "index.json";
const FORMAT_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    dimension: Option<usize>,
    entries: BTreeMap<String, IndexedVector>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            dimension: None,
            entries: BTreeMap::new(),
        }
    }
}

pub struct LocalIndex {
    file: PathBuf,
    state: RwLock<Snapshot>,
}

impl LocalIndex {
    /// Opens (or creates) the index stored under `dir`.
    ///
    /// # Errors
    /// - [`RagError::Config`] if the directory cannot be created
    /// - [`RagError::Index`] if an existing index file is unreadable
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, RagError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            RagError::Config(format!("unusable storage path {}: {e}", dir.display()))
        })?;

        let file = dir.join(INDEX_FILE);
        let snapshot = match tokio::fs::read(&file).await {
            Ok(bytes) => serde_json::from_slice::<Snapshot>(&bytes).map_err(|e| {
                RagError::Index(format!("corrupted index file {}: {e}", file.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(e.into()),
        };

        info!(
            path = %file.display(),
            entries = snapshot.entries.len(),
            "local index opened"
        );
        Ok(Self {
            file,
            state: RwLock::new(snapshot),
        })
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), RagError> {
        let bytes = serde_json::to_vec(snapshot)?;
        let tmp = self.file.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.file).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(batch = items.len()))]
    async fn upsert_inner(&self, items: Vec<IndexedVector>) -> Result<usize, RagError> {
        if items.is_empty() {
            return Ok(0);
        }
        let dim = batch_dimension(&items)?;

        let mut state = self.state.write().await;
        if let Some(want) = state.dimension.filter(|_| !state.entries.is_empty()) {
            if want != dim {
                return Err(RagError::VectorSizeMismatch { got: dim, want });
            }
        }

        let mut next = state.clone();
        next.dimension = Some(dim);
        let written = items.len();
        for item in items {
            next.entries.insert(item.id.clone(), item);
        }
        self.persist(&next).await?;
        *state = next;

        debug!(written, total = state.entries.len(), "local upsert done");
        Ok(written)
    }

    async fn query_inner(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&RagFilter>,
    ) -> Result<Vec<RagHit>, RagError> {
        let state = self.state.read().await;
        if top_k == 0 || state.entries.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(want) = state.dimension {
            if want != vector.len() {
                return Err(RagError::VectorSizeMismatch {
                    got: vector.len(),
                    want,
                });
            }
        }

        let mut hits: Vec<RagHit> = state
            .entries
            .values()
            .filter(|e| filter.is_none_or(|f| filters::matches(f, &e.metadata)))
            .map(|e| RagHit {
                id: e.id.clone(),
                score: cosine(vector, &e.embedding),
                text: e.text.clone(),
                metadata: e.metadata.clone(),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn clear_inner(&self) -> Result<(), RagError> {
        let mut state = self.state.write().await;
        let empty = Snapshot::default();
        self.persist(&empty).await?;
        let dropped = state.entries.len();
        *state = empty;
        warn!(dropped, path = %self.file.display(), "local index cleared");
        Ok(())
    }
}

impl VectorIndex for LocalIndex {
    fn upsert(&self, items: Vec<IndexedVector>) -> BoxFuture<'_, Result<usize, RagError>> {
        self.upsert_inner(items).boxed()
    }

    fn query<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: usize,
        filter: Option<&'a RagFilter>,
    ) -> BoxFuture<'a, Result<Vec<RagHit>, RagError>> {
        self.query_inner(vector, top_k, filter).boxed()
    }

    fn count(&self) -> BoxFuture<'_, Result<usize, RagError>> {
        async move { Ok(self.state.read().await.entries.len()) }.boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), RagError>> {
        self.clear_inner().boxed()
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}

/// Cosine similarity; `0.0` when either vector has zero norm.
pub(crate) fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ChunkMetadata;

    fn item(id: &str, doc: &str, page: u32, text: &str, v: Vec<f32>) -> IndexedVector {
        IndexedVector {
            id: id.into(),
            embedding: v,
            text: text.into(),
            metadata: ChunkMetadata {
                doc_id: doc.into(),
                source_name: format!("{doc}.pdf"),
                page_number: page,
                chunk_index: 0,
                char_start: 0,
                char_end: text.len(),
            },
        }
    }

    #[tokio::test]
    async fn empty_index_returns_no_hits() {
        let dir = tempfile::tempdir().unwrap();
        let idx = LocalIndex::open(dir.path()).await.unwrap();
        assert!(idx.query(&[1.0, 0.0], 5, None).await.unwrap().is_empty());
        assert_eq!(idx.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reindexing_an_id_replaces_it() {
        let dir = tempfile::tempdir().unwrap();
        let idx = LocalIndex::open(dir.path()).await.unwrap();
        idx.upsert(vec![item("doc1_0", "doc1", 1, "old", vec![1.0, 0.0])]).await.unwrap();
        idx.upsert(vec![item("doc1_0", "doc1", 2, "new", vec![0.0, 1.0])]).await.unwrap();

        assert_eq!(idx.count().await.unwrap(), 1);
        let hits = idx.query(&[0.0, 1.0], 5, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "new");
        assert_eq!(hits[0].metadata.page_number, 2);
    }

    #[tokio::test]
    async fn results_are_ranked_and_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let idx = LocalIndex::open(dir.path()).await.unwrap();
        idx.upsert(vec![
            item("a", "d", 1, "far", vec![0.0, 1.0]),
            item("b", "d", 1, "near", vec![1.0, 0.1]),
            item("c", "d", 1, "mid", vec![1.0, 1.0]),
        ])
        .await
        .unwrap();

        let hits = idx.query(&[1.0, 0.0], 2, None).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn filters_restrict_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let idx = LocalIndex::open(dir.path()).await.unwrap();
        idx.upsert(vec![
            item("a_0", "a", 1, "x", vec![1.0, 0.0]),
            item("b_0", "b", 3, "y", vec![1.0, 0.0]),
        ])
        .await
        .unwrap();

        let f = RagFilter::doc("b");
        let hits = idx.query(&[1.0, 0.0], 5, Some(&f)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.doc_id, "b");
    }

    #[tokio::test]
    async fn survives_reopen_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        {
            let idx = LocalIndex::open(dir.path()).await.unwrap();
            idx.upsert(vec![item("a", "d", 1, "x", vec![1.0])]).await.unwrap();
        }
        let idx = LocalIndex::open(dir.path()).await.unwrap();
        assert_eq!(idx.count().await.unwrap(), 1);

        idx.clear().await.unwrap();
        assert_eq!(idx.count().await.unwrap(), 0);
        let reopened = LocalIndex::open(dir.path()).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clear_rewrites_the_snapshot_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let idx = LocalIndex::open(dir.path()).await.unwrap();
        idx.upsert(vec![item("a", "d", 1, "x", vec![1.0])]).await.unwrap();

        idx.clear().await.unwrap();
        let file = dir.path().join(INDEX_FILE);
        assert!(file.exists());
        let raw = std::fs::read_to_string(&file).unwrap();
        assert!(!raw.contains("\"a\""));
        assert_eq!(LocalIndex::open(dir.path()).await.unwrap().count().await.unwrap(), 0);

        idx.clear().await.unwrap();
        assert!(file.exists());
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let idx = LocalIndex::open(dir.path()).await.unwrap();
        idx.upsert(vec![item("a", "d", 1, "x", vec![1.0, 0.0])]).await.unwrap();

        let err = idx.upsert(vec![item("b", "d", 1, "y", vec![1.0])]).await.unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 1, want: 2 }));
        assert!(matches!(
            idx.query(&[1.0, 0.0, 0.0], 1, None).await,
            Err(RagError::VectorSizeMismatch { .. })
        ));
        assert_eq!(idx.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn corrupted_file_is_an_index_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), b"{not json").unwrap();
        assert!(matches!(LocalIndex::open(dir.path()).await, Err(RagError::Index(_))));
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
