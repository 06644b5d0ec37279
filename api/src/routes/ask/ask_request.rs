use rag_store::RagFilter;
use serde::Deserialize;
use serde_json::Value;

/// Request payload for /ask.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Natural language question.
    pub question: String,
    /// Optional metadata predicate applied before ranking.
    #[serde(default)]
    pub filter: Option<RagFilter>,
    /// Shorthand for `filter.equals = [["doc_id", …]]`.
    #[serde(default)]
    pub doc_id: Option<String>,
}

impl AskRequest {
    /// Effective filter: `filter` plus the `doc_id` shorthand; `None` when empty.
    pub fn rag_filter(&self) -> Option<RagFilter> {
        let mut f = self.filter.clone().unwrap_or_default();
        if let Some(doc) = self.doc_id.as_deref().filter(|d| !d.trim().is_empty()) {
            f.equals.push(("doc_id".to_string(), Value::String(doc.to_string())));
        }
        (!f.is_empty()).then_some(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_id_shorthand_merges_into_filter() {
        let req: AskRequest = serde_json::from_value(serde_json::json!({
            "question": "q",
            "doc_id": "paper",
            "filter": { "ranges": [{ "field": "page_number", "gte": 2 }] }
        }))
        .unwrap();
        let f = req.rag_filter().unwrap();
        assert_eq!(f.equals.len(), 1);
        assert_eq!(f.ranges.len(), 1);

        let bare: AskRequest = serde_json::from_str(r#"{"question":"q"}"#).unwrap();
        assert!(bare.rag_filter().is_none());
    }
}
