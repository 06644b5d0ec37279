//! Core data models shared by ingestion, indexing and retrieval.
//!
//! Every layer reads and writes these types; field names are the same on the
//! wire (API JSON, local index file, Qdrant payload).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page-level metadata carried forward into every chunk cut from the page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecordMetadata {
    /// Source document identifier (the PDF file stem for loaded files).
    pub doc_id: String,
    /// Original file name, for display.
    pub source_name: String,
    /// 1-based page number; `0` when page tracking is unavailable.
    #[serde(default)]
    pub page_number: u32,
    /// Character offset of this page within its document.
    #[serde(default)]
    pub char_offset: usize,
}

/// One page of one document, as produced by the loader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(flatten)]
    pub meta: PageRecordMetadata,
    pub text: String,
}

/// Citation metadata stored with every chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub doc_id: String,
    pub source_name: String,
    #[serde(default)]
    pub page_number: u32,
    /// Position of the chunk within its page or document.
    #[serde(default)]
    pub chunk_index: usize,
    /// Document-level character span `[char_start, char_end)`.
    #[serde(default)]
    pub char_start: usize,
    #[serde(default)]
    pub char_end: usize,
}

impl ChunkMetadata {
    /// Human-readable citation header, e.g. `[Source: paper.pdf, page 3]`.
    pub fn citation_label(&self) -> String {
        if self.page_number == 0 {
            format!("[Source: {}, page n/a]", self.source_name)
        } else {
            format!("[Source: {}, page {}]", self.source_name, self.page_number)
        }
    }

    /// Looks up a metadata field by its serialized name (used by filters).
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "doc_id" => Some(Value::from(self.doc_id.as_str())),
            "source_name" => Some(Value::from(self.source_name.as_str())),
            "page_number" => Some(Value::from(self.page_number)),
            "chunk_index" => Some(Value::from(self.chunk_index as u64)),
            "char_start" => Some(Value::from(self.char_start as u64)),
            "char_end" => Some(Value::from(self.char_end as u64)),
            _ => None,
        }
    }
}

/// Unit of retrievable text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique within an index: `{doc_id}_{char_start}`, or `{doc_id}_p{page}_{start}`
    /// for a page chunked on its own without a document offset.
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Persisted form inside a vector index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexedVector {
    pub id: String,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl IndexedVector {
    pub fn from_chunk(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: chunk.id,
            embedding,
            text: chunk.text,
            metadata: chunk.metadata,
        }
    }
}

/// A single retrieval hit. Hits are returned closest first.
#[derive(Clone, Debug, Serialize)]
pub struct RagHit {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Inclusive numeric range on a metadata field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeCondition {
    pub field: String,
    #[serde(default)]
    pub gte: Option<f64>,
    #[serde(default)]
    pub lte: Option<f64>,
}

/// Metadata predicate: every condition must hold (logical AND).
///
/// ```json
/// { "equals": [["doc_id", "2302.13971v1"]],
///   "ranges": [{ "field": "page_number", "gte": 2, "lte": 5 }] }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RagFilter {
    /// Exact match on a field, e.g. `("doc_id", "paper")`.
    #[serde(default)]
    pub equals: Vec<(String, Value)>,
    #[serde(default)]
    pub ranges: Vec<RangeCondition>,
}

impl RagFilter {
    /// Restricts results to one source document.
    pub fn doc(doc_id: impl Into<String>) -> Self {
        Self {
            equals: vec![("doc_id".to_string(), Value::String(doc_id.into()))],
            ranges: Vec::new(),
        }
    }

    /// Adds an inclusive page range.
    pub fn with_pages(mut self, first: u32, last: u32) -> Self {
        self.ranges.push(RangeCondition {
            field: "page_number".to_string(),
            gte: Some(first as f64),
            lte: Some(last as f64),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty() && self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(page: u32) -> ChunkMetadata {
        ChunkMetadata {
            doc_id: "doc1".into(),
            source_name: "doc1.pdf".into(),
            page_number: page,
            chunk_index: 0,
            char_start: 0,
            char_end: 10,
        }
    }

    #[test]
    fn citation_label_handles_unknown_page() {
        assert_eq!(meta(3).citation_label(), "[Source: doc1.pdf, page 3]");
        assert_eq!(meta(0).citation_label(), "[Source: doc1.pdf, page n/a]");
    }

    #[test]
    fn page_record_is_flat_on_the_wire() {
        let json = r#"{"doc_id":"d","source_name":"d.pdf","page_number":2,"text":"hello"}"#;
        let page: PageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(page.meta.page_number, 2);
        assert_eq!(page.meta.char_offset, 0);
        assert_eq!(page.text, "hello");
    }

    #[test]
    fn filter_deserializes_from_partial_json() {
        let f: RagFilter = serde_json::from_str(r#"{"equals":[["doc_id","doc1"]]}"#).unwrap();
        assert_eq!(f, RagFilter::doc("doc1"));
        assert!(!f.is_empty());
    }
}
