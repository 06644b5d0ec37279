//! Public result types re-used by external crates (e.g., the HTTP API layer).

use rag_store::RagHit;
use serde::{Deserialize, Serialize};

/// Outcome flag of an answer or a generation call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStatus {
    Success,
    Error,
}

impl AnswerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerStatus::Success => "success",
            AnswerStatus::Error => "error",
        }
    }
}

/// Metadata of one retrieved chunk, enough to render "source X, page Y".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub chunk_id: String,
    pub doc_id: String,
    pub source_name: String,
    /// `0` when the page is unknown.
    pub page_number: u32,
    pub score: f32,
}

impl From<&RagHit> for Citation {
    fn from(h: &RagHit) -> Self {
        Self {
            chunk_id: h.id.clone(),
            doc_id: h.metadata.doc_id.clone(),
            source_name: h.metadata.source_name.clone(),
            page_number: h.metadata.page_number,
            score: h.score,
        }
    }
}

/// Result of one `answer()` call.
///
/// `citations[i]` and `source_snippets[i]` always describe the same retrieved
/// chunk, in retrieval order (closest first).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub answer_text: String,
    pub status: AnswerStatus,
    pub citations: Vec<Citation>,
    pub source_snippets: Vec<String>,
    /// Wall-clock time of the whole call.
    pub latency_ms: u64,
    pub retrieved_count: usize,
}

impl AnswerRecord {
    pub fn is_success(&self) -> bool {
        self.status == AnswerStatus::Success
    }
}
