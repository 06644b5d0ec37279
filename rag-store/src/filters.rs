//! Metadata filter evaluation.
//!
//! A [`RagFilter`] is a conjunction: every equality and range condition must
//! hold. The same semantics are applied in-process (local index) and
//! translated to a Qdrant `must` filter.

use qdrant_client::qdrant::{Condition, Filter, Range};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::RagError;
use crate::record::{ChunkMetadata, RagFilter};

/// Returns `true` when `meta` satisfies every condition of `filter`.
///
/// Unknown fields never match.
pub fn matches(filter: &RagFilter, meta: &ChunkMetadata) -> bool {
    let equals_ok = filter.equals.iter().all(|(field, want)| {
        meta.field(field)
            .is_some_and(|have| values_equal(&have, &normalize(field, want)))
    });
    if !equals_ok {
        return false;
    }
    filter.ranges.iter().all(|r| {
        let Some(v) = meta.field(&r.field).and_then(|v| v.as_f64()) else {
            return false;
        };
        r.gte.is_none_or(|lo| v >= lo) && r.lte.is_none_or(|hi| v <= hi)
    })
}

fn values_equal(have: &Value, want: &Value) -> bool {
    match (have, want) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => have == want,
    }
}

/// Metadata fields stored as integers.
const NUMERIC_FIELDS: &[&str] = &["page_number", "chunk_index", "char_start", "char_end"];

/// Brings an equality value to the form both backends compare against.
///
/// On numeric fields, integral floats (`3.0`) and numeric strings (`"3"`)
/// become integers. Everything else passes through unchanged.
fn normalize(field: &str, val: &Value) -> Value {
    if !NUMERIC_FIELDS.contains(&field) {
        return val.clone();
    }
    let as_int = match val {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    as_int.map(Value::from).unwrap_or_else(|| val.clone())
}

/// Converts [`RagFilter`] to a Qdrant [`Filter`] (all conditions in `must`).
///
/// # Errors
/// [`RagError::InvalidInput`] for values Qdrant cannot match exactly
/// (fractional numbers, arrays, objects, null).
pub fn to_qdrant_filter(f: &RagFilter) -> Result<Filter, RagError> {
    debug!(equals = f.equals.len(), ranges = f.ranges.len(), "filters::to_qdrant_filter");

    let mut must: Vec<Condition> = Vec::with_capacity(f.equals.len() + f.ranges.len());

    for (field, raw) in &f.equals {
        let val = &normalize(field, raw);
        let cond = match val {
            Value::String(s) => Condition::matches(field.clone(), s.clone()),
            Value::Bool(b) => Condition::matches(field.clone(), *b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Condition::matches(field.clone(), i),
                None => return Err(unsupported(field, raw)),
            },
            _ => return Err(unsupported(field, raw)),
        };
        must.push(cond);
    }

    for r in &f.ranges {
        must.push(Condition::range(
            r.field.clone(),
            Range {
                gte: r.gte,
                lte: r.lte,
                ..Default::default()
            },
        ));
    }

    Ok(Filter::must(must))
}

fn unsupported(field: &str, val: &Value) -> RagError {
    warn!(%field, value = %val, "unsupported filter value");
    RagError::InvalidInput(format!("unsupported filter value for `{field}`: {val}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(doc: &str, page: u32) -> ChunkMetadata {
        ChunkMetadata {
            doc_id: doc.into(),
            source_name: format!("{doc}.pdf"),
            page_number: page,
            chunk_index: 0,
            char_start: 0,
            char_end: 1,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(matches(&RagFilter::default(), &meta("a", 1)));
    }

    #[test]
    fn equality_and_ranges_are_conjunctive() {
        let f = RagFilter::doc("a").with_pages(2, 4);
        assert!(matches(&f, &meta("a", 3)));
        assert!(!matches(&f, &meta("a", 5)));
        assert!(!matches(&f, &meta("b", 3)));
    }

    #[test]
    fn numeric_equality_ignores_representation() {
        let f = RagFilter {
            equals: vec![("page_number".into(), json!(3.0))],
            ranges: vec![],
        };
        assert!(matches(&f, &meta("a", 3)));
        let f = RagFilter {
            equals: vec![("page_number".into(), json!("3"))],
            ranges: vec![],
        };
        assert!(matches(&f, &meta("a", 3)));
        assert!(!matches(&f, &meta("a", 4)));
    }

    #[test]
    fn numeric_strings_stay_text_on_text_fields() {
        let f = RagFilter {
            equals: vec![("doc_id".into(), json!("3"))],
            ranges: vec![],
        };
        assert!(matches(&f, &meta("3", 1)));
        assert!(!matches(&f, &meta("a", 3)));
        assert_eq!(normalize("doc_id", &json!("3")), json!("3"));
    }

    #[test]
    fn qdrant_filter_matches_the_local_reading_of_numbers() {
        for want in [json!(3), json!(3.0), json!("3"), json!(" 3 ")] {
            assert_eq!(normalize("page_number", &want), json!(3));
            let f = RagFilter {
                equals: vec![("page_number".into(), want.clone())],
                ranges: vec![],
            };
            assert!(matches(&f, &meta("a", 3)), "{want}");
            let q = to_qdrant_filter(&f).unwrap();
            assert_eq!(q.must, vec![Condition::matches("page_number", 3i64)], "{want}");
        }
    }

    #[test]
    fn fractional_pages_are_rejected_by_qdrant_and_never_match_locally() {
        let f = RagFilter {
            equals: vec![("page_number".into(), json!(2.5))],
            ranges: vec![],
        };
        assert!(!matches(&f, &meta("a", 2)));
        assert!(!matches(&f, &meta("a", 3)));
        assert!(matches!(to_qdrant_filter(&f), Err(RagError::InvalidInput(_))));
    }

    #[test]
    fn unknown_field_never_matches() {
        let f = RagFilter {
            equals: vec![("author".into(), json!("x"))],
            ranges: vec![],
        };
        assert!(!matches(&f, &meta("a", 1)));
    }

    #[test]
    fn qdrant_filter_uses_must() {
        let f = RagFilter::doc("a").with_pages(1, 2);
        let q = to_qdrant_filter(&f).unwrap();
        assert_eq!(q.must.len(), 2);
        assert!(q.should.is_empty());
    }

    #[test]
    fn qdrant_filter_rejects_objects() {
        let f = RagFilter {
            equals: vec![("doc_id".into(), json!({"x": 1}))],
            ranges: vec![],
        };
        assert!(matches!(to_qdrant_filter(&f), Err(RagError::InvalidInput(_))));
    }
}
