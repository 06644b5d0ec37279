//! Lightweight QA evaluation log.
//!
//! One JSON line per answered question, for manual review of answer quality
//! and latency. Appending never affects the answer itself.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::api_types::{AnswerRecord, AnswerStatus};
use crate::error::PipelineError;

/// One logged question/answer pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QaLogEntry {
    /// RFC3339 UTC.
    pub timestamp: String,
    pub question: String,
    pub answer: String,
    pub status: AnswerStatus,
    /// Distinct source files cited, in retrieval order.
    pub source_docs: Vec<String>,
    pub latency_ms: u64,
    #[serde(default)]
    pub notes: String,
}

impl QaLogEntry {
    pub fn from_answer(question: &str, record: &AnswerRecord, notes: impl Into<String>) -> Self {
        let mut source_docs: Vec<String> = Vec::new();
        for c in &record.citations {
            if !source_docs.contains(&c.source_name) {
                source_docs.push(c.source_name.clone());
            }
        }
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            question: question.to_string(),
            answer: record.answer_text.clone(),
            status: record.status,
            source_docs,
            latency_ms: record.latency_ms,
            notes: notes.into(),
        }
    }
}

/// Appends `entry` as one JSON line, creating the file and parent directories.
pub async fn append_qa_log(path: &Path, entry: &QaLogEntry) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(rag_store::RagError::from)?;
    }
    let mut line = serde_json::to_vec(entry).map_err(rag_store::RagError::from)?;
    line.push(b'\n');

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(rag_store::RagError::from)?;
    file.write_all(&line).await.map_err(rag_store::RagError::from)?;
    file.flush().await.map_err(rag_store::RagError::from)?;
    Ok(())
}

/// A reviewer question with a slot for the reviewer's answer.
#[derive(Clone, Debug, Serialize)]
pub struct FeedbackItem {
    pub question: &'static str,
    pub answer: String,
}

/// Questions used to grade an answer by hand.
pub fn qualitative_feedback_template() -> Vec<FeedbackItem> {
    [
        "Was the main contribution correctly summarized?",
        "Did the answer reference relevant parts of the paper?",
        "Were limitations of the method mentioned?",
    ]
    .into_iter()
    .map(|question| FeedbackItem {
        question,
        answer: String::new(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_types::Citation;

    fn record() -> AnswerRecord {
        let cite = |id: &str, src: &str| Citation {
            chunk_id: id.into(),
            doc_id: src.trim_end_matches(".pdf").into(),
            source_name: src.into(),
            page_number: 1,
            score: 0.9,
        };
        AnswerRecord {
            answer_text: "It scales [Source: a.pdf, page 1]".into(),
            status: AnswerStatus::Success,
            citations: vec![cite("a_0", "a.pdf"), cite("b_0", "b.pdf"), cite("a_800", "a.pdf")],
            source_snippets: vec!["x".into(), "y".into(), "z".into()],
            latency_ms: 42,
            retrieved_count: 3,
        }
    }

    #[test]
    fn source_docs_are_distinct_and_ordered() {
        let e = QaLogEntry::from_answer("q?", &record(), "");
        assert_eq!(e.source_docs, vec!["a.pdf", "b.pdf"]);
        assert_eq!(e.latency_ms, 42);
    }

    #[tokio::test]
    async fn appends_one_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("qa.jsonl");
        let e = QaLogEntry::from_answer("q?", &record(), "first");
        append_qa_log(&path, &e).await.unwrap();
        append_qa_log(&path, &e).await.unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: QaLogEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.notes, "first");
        assert_eq!(parsed.status, AnswerStatus::Success);
    }

    #[test]
    fn feedback_template_has_three_open_questions() {
        let t = qualitative_feedback_template();
        assert_eq!(t.len(), 3);
        assert!(t.iter().all(|i| i.answer.is_empty()));
    }
}
