//! Qdrant-backed vector index.
//!
//! Keeps every `qdrant-client` call behind the [`VectorIndex`] contract.
//! Chunk ids are arbitrary strings, so point ids are UUIDv5 of the chunk id;
//! the original id travels in the payload under `chunk_id`.

use std::collections::HashMap;

use futures::FutureExt;
use futures::future::BoxFuture;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, SearchParamsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::{DistanceKind, QdrantConfig};
use crate::errors::RagError;
use crate::filters::to_qdrant_filter;
use crate::index::{VectorIndex, batch_dimension};
use crate::record::{ChunkMetadata, IndexedVector, RagFilter, RagHit};

pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    distance: DistanceKind,
    exact: bool,
}

impl QdrantIndex {
    /// Builds the client. No network call happens until the first operation.
    pub fn new(cfg: &QdrantConfig) -> Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&cfg.url);
        if let Some(key) = &cfg.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build().map_err(qerr)?;
        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            distance: cfg.distance,
            exact: cfg.exact_search,
        })
    }

    async fn exists(&self) -> Result<bool, RagError> {
        self.client
            .collection_exists(&self.collection)
            .await
            .map_err(qerr)
    }

    /// Creates the collection for `size`-dimensional vectors when missing.
    async fn ensure_collection(&self, size: usize) -> Result<(), RagError> {
        if self.exists().await? {
            debug!(collection = %self.collection, "collection already exists");
            return Ok(());
        }
        let distance = match self.distance {
            DistanceKind::Cosine => Distance::Cosine,
            DistanceKind::Dot => Distance::Dot,
            DistanceKind::Euclid => Distance::Euclid,
        };
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(size as u64, distance)),
            )
            .await
            .map_err(qerr)?;
        info!(collection = %self.collection, size, distance = ?self.distance, "collection created");
        Ok(())
    }

    #[instrument(skip_all, fields(collection = %self.collection, batch = items.len()))]
    async fn upsert_inner(&self, items: Vec<IndexedVector>) -> Result<usize, RagError> {
        if items.is_empty() {
            return Ok(0);
        }
        let dim = batch_dimension(&items)?;
        self.ensure_collection(dim).await?;

        let written = items.len();
        let points = items
            .into_iter()
            .map(to_point)
            .collect::<Result<Vec<_>, _>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(qerr)?;
        debug!(written, "qdrant upsert done");
        Ok(written)
    }

    async fn query_inner(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&RagFilter>,
    ) -> Result<Vec<RagHit>, RagError> {
        if top_k == 0 || !self.exists().await? {
            return Ok(Vec::new());
        }

        let mut builder = SearchPointsBuilder::new(&self.collection, vector.to_vec(), top_k as u64)
            .with_payload(true);
        if let Some(f) = filter.filter(|f| !f.is_empty()) {
            builder = builder.filter(to_qdrant_filter(f)?);
        }
        if self.exact {
            builder = builder.params(SearchParamsBuilder::default().exact(true));
        }

        let res = self.client.search_points(builder).await.map_err(qerr)?;

        let mut out = Vec::with_capacity(res.result.len());
        for point in res.result {
            out.push(hit_from_payload(point.score, point.payload)?);
        }
        debug!(hits = out.len(), "qdrant search done");
        Ok(out)
    }

    async fn count_inner(&self) -> Result<usize, RagError> {
        if !self.exists().await? {
            return Ok(0);
        }
        let res = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .map_err(qerr)?;
        Ok(res.result.map(|r| r.count as usize).unwrap_or(0))
    }

    async fn clear_inner(&self) -> Result<(), RagError> {
        if self.exists().await? {
            self.client
                .delete_collection(&self.collection)
                .await
                .map_err(qerr)?;
        }
        // Recreated lazily by the next upsert, once the dimension is known.
        warn!(collection = %self.collection, "qdrant collection dropped");
        Ok(())
    }
}

impl VectorIndex for QdrantIndex {
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
        self.count_inner().boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), RagError>> {
        self.clear_inner().boxed()
    }

    fn backend(&self) -> &'static str {
        "qdrant"
    }
}

fn qerr(e: impl std::fmt::Display) -> RagError {
    RagError::Qdrant(e.to_string())
}

/// Deterministic point id for a chunk id.
pub(crate) fn point_id(chunk_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, chunk_id.as_bytes())
}

fn to_point(item: IndexedVector) -> Result<PointStruct, RagError> {
    let m = &item.metadata;
    let payload = Payload::try_from(json!({
        "chunk_id": item.id,
        "text": item.text,
        "doc_id": m.doc_id,
        "source_name": m.source_name,
        "page_number": m.page_number,
        "chunk_index": m.chunk_index,
        "char_start": m.char_start,
        "char_end": m.char_end,
    }))
    .map_err(qerr)?;
    Ok(PointStruct::new(
        point_id(&item.id).to_string(),
        item.embedding,
        payload,
    ))
}

fn hit_from_payload(score: f32, payload: HashMap<String, QValue>) -> Result<RagHit, RagError> {
    let json = qpayload_to_json(payload);
    let id = json
        .get("chunk_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RagError::Qdrant("point payload without chunk_id".into()))?
        .to_string();
    let text = json
        .get("text")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let metadata: ChunkMetadata = serde_json::from_value(json)?;
    Ok(RagHit {
        id,
        score,
        text,
        metadata,
    })
}

/// Converts a flat Qdrant payload into JSON; nested values map to `Null`.
fn qpayload_to_json(payload: HashMap<String, QValue>) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind as K;
    let mut m = serde_json::Map::new();
    for (k, v) in payload {
        let j = match v.kind {
            Some(K::StringValue(s)) => serde_json::Value::String(s),
            Some(K::IntegerValue(i)) => serde_json::Value::Number(i.into()),
            Some(K::DoubleValue(f)) => json!(f),
            Some(K::BoolValue(b)) => serde_json::Value::Bool(b),
            _ => serde_json::Value::Null,
        };
        m.insert(k, j);
    }
    serde_json::Value::Object(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ids_are_stable_and_distinct() {
        assert_eq!(point_id("doc1_0"), point_id("doc1_0"));
        assert_ne!(point_id("doc1_0"), point_id("doc1_200"));
    }

    #[test]
    fn payload_roundtrips_into_a_hit() {
        let item = IndexedVector {
            id: "doc1_200".into(),
            embedding: vec![0.1, 0.2],
            text: "window".into(),
            metadata: ChunkMetadata {
                doc_id: "doc1".into(),
                source_name: "doc1.pdf".into(),
                page_number: 4,
                chunk_index: 1,
                char_start: 200,
                char_end: 400,
            },
        };
        let expected = item.metadata.clone();
        let point = to_point(item).unwrap();
        let hit = hit_from_payload(0.9, point.payload).unwrap();
        assert_eq!(hit.id, "doc1_200");
        assert_eq!(hit.text, "window");
        assert_eq!(hit.metadata, expected);
    }
}
