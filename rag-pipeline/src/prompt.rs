//! Prompt builder: grounding system instruction + cited context block.

use rag_store::RagHit;

/// Separator placed between context passages.
pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Sentence the model must use when the passages are insufficient.
pub const INSUFFICIENT_CONTEXT: &str =
    "The provided passages do not contain enough information to answer this.";

/// Grounding and citation policy sent as the system message.
pub const SYSTEM_INSTRUCTION: &str = "\
You are a research assistant answering questions about academic papers.
Follow these rules strictly:
1. Use ONLY the information in the provided context passages. Do not rely on prior knowledge.
2. If the context is empty or does not contain the answer, reply exactly: \
\"The provided passages do not contain enough information to answer this.\" Never invent facts.
3. Cite the source of every factual claim using the passage header, e.g. [Source: 2302.13971v1.pdf, page 3].
4. Keep a neutral, professional tone.";

/// Joins hits in retrieval order, each preceded by its citation header.
///
/// Returns an empty string when there are no hits.
pub fn build_context(hits: &[RagHit]) -> String {
    hits.iter()
        .map(|h| format!("{}\n{}", h.metadata.citation_label(), h.text.trim()))
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}

/// Builds the single user turn: context, question, instructions.
pub fn build_user_prompt(question: &str, context: &str) -> String {
    format!(
        "### CONTEXT:\n{context}\n\n### QUESTION:\n{}\n\n### INSTRUCTIONS:\n\
         Based on the context above, provide a concise answer with citations.",
        question.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_store::ChunkMetadata;

    fn hit(id: &str, page: u32, text: &str) -> RagHit {
        RagHit {
            id: id.into(),
            score: 0.5,
            text: text.into(),
            metadata: ChunkMetadata {
                doc_id: "llama".into(),
                source_name: "llama.pdf".into(),
                page_number: page,
                chunk_index: 0,
                char_start: 0,
                char_end: text.len(),
            },
        }
    }

    #[test]
    fn context_keeps_retrieval_order_with_headers() {
        let ctx = build_context(&[hit("a", 2, " first "), hit("b", 7, "second")]);
        assert_eq!(
            ctx,
            "[Source: llama.pdf, page 2]\nfirst\n\n---\n\n[Source: llama.pdf, page 7]\nsecond"
        );
    }

    #[test]
    fn empty_hits_give_empty_context() {
        assert_eq!(build_context(&[]), "");
        let p = build_user_prompt("What is X?", "");
        assert!(p.starts_with("### CONTEXT:\n\n\n### QUESTION:\nWhat is X?"));
    }

    #[test]
    fn system_instruction_carries_the_refusal_sentence() {
        assert!(SYSTEM_INSTRUCTION.contains(INSUFFICIENT_CONTEXT));
    }
}
