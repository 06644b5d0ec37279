//! The orchestrator: indexing path and answer path.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use ai_llm_service::{ChatTurn, LlmServiceProfiles};
use rag_store::{
    Chunk, Chunker, EmbeddingsProvider, IndexedVector, LlmEmbedder, PageRecord, RagError,
    RagFilter, VectorIndex, open_index,
};
use tracing::{debug, error, info, instrument, warn};

use crate::api_types::{AnswerRecord, Citation};
use crate::cfg::PipelineConfig;
use crate::error::PipelineError;
use crate::evaluation::{QaLogEntry, append_qa_log};
use crate::generator::{AnswerGenerator, LlmGenerator};
use crate::prompt;

/// Knobs that do not belong to any collaborator.
#[derive(Clone, Debug)]
pub struct PipelineSettings {
    pub top_k: usize,
    pub qa_log_path: Option<PathBuf>,
}

/// Retrieval-augmented answer pipeline.
///
/// Construct once at process start and share behind `Arc`; every method takes
/// `&self`. Concurrent writes are serialized by the index backend.
pub struct RagPipeline {
    embedder: Arc<dyn EmbeddingsProvider>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn AnswerGenerator>,
    chunker: Chunker,
    settings: PipelineSettings,
}

impl RagPipeline {
    /// Assembles a pipeline from explicit collaborators.
    pub fn new(
        embedder: Arc<dyn EmbeddingsProvider>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn AnswerGenerator>,
        chunker: Chunker,
        settings: PipelineSettings,
    ) -> Result<Self, PipelineError> {
        if settings.top_k == 0 {
            return Err(PipelineError::Config("top_k must be > 0".into()));
        }
        Ok(Self {
            embedder,
            index,
            generator,
            chunker,
            settings,
        })
    }

    /// Wires the LLM-backed embedder and generator plus the configured index.
    ///
    /// The generator deadline is the generation profile's request timeout, the
    /// same ceiling its HTTP client uses.
    pub async fn from_config(
        cfg: &PipelineConfig,
        svc: Arc<LlmServiceProfiles>,
    ) -> Result<Self, PipelineError> {
        cfg.validate()?;
        let index = open_index(&cfg.index).await?;
        let timeout = svc.profiles().0.request_timeout();

        let embedder = Arc::new(LlmEmbedder::new(svc.clone(), cfg.embedding_dim));
        let generator = Arc::new(LlmGenerator::new(svc, timeout));

        info!(
            backend = index.backend(),
            top_k = cfg.top_k,
            chunk_size = cfg.chunk_size,
            chunk_overlap = cfg.chunk_overlap,
            timeout_secs = timeout.as_secs(),
            "pipeline ready"
        );

        Self::new(
            embedder,
            index,
            generator,
            cfg.chunker()?,
            PipelineSettings {
                top_k: cfg.top_k,
                qa_log_path: cfg.qa_log_path.clone(),
            },
        )
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    pub fn top_k(&self) -> usize {
        self.settings.top_k
    }

    pub fn index_backend(&self) -> &'static str {
        self.index.backend()
    }

    /// Embeds all chunk texts in one batch and upserts them in one call.
    ///
    /// # Errors
    /// - [`PipelineError::InvalidInput`] for an empty batch, blank text or duplicate ids
    /// - [`PipelineError::Rag`] if embedding or the index write fails; nothing is
    ///   written when embedding fails
    #[instrument(skip_all, fields(chunks = chunks.len()))]
    pub async fn index(&self, chunks: Vec<Chunk>) -> Result<usize, PipelineError> {
        validate_batch(&chunks)?;

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await.map_err(|e| {
            error!(error = %e, "embedding failed; nothing indexed");
            e
        })?;
        if vectors.len() != chunks.len() {
            return Err(RagError::Embedding(format!(
                "provider returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            ))
            .into());
        }

        let items: Vec<IndexedVector> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(c, v)| IndexedVector::from_chunk(c, v))
            .collect();

        let written = self.index.upsert(items).await.map_err(|e| {
            error!(error = %e, "index write failed");
            e
        })?;
        info!(written, "chunks indexed");
        Ok(written)
    }

    /// Answers `question` from retrieved context.
    ///
    /// Steps: embed the question, retrieve `top_k` hits (optionally filtered),
    /// assemble cited context in retrieval order, generate, package.
    /// Zero hits still reach the generator with an empty context.
    ///
    /// # Errors
    /// Embedding and retrieval failures propagate. Generation failures and
    /// timeouts do not: they produce `status = error` with an explanation.
    #[instrument(skip_all, fields(top_k = self.settings.top_k, filtered = filter.is_some()))]
    pub async fn answer(
        &self,
        question: &str,
        filter: Option<&RagFilter>,
    ) -> Result<AnswerRecord, PipelineError> {
        let started = Instant::now();
        if question.trim().is_empty() {
            return Err(PipelineError::InvalidInput("question is empty".into()));
        }

        // 1) Embed the query as a single-item batch
        let batch = [question.to_string()];
        let query_vec = self
            .embedder
            .embed(&batch)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("no vector returned for the question".into()))?;

        // 2) Retrieve
        let hits = self
            .index
            .query(&query_vec, self.settings.top_k, filter)
            .await?;
        if hits.is_empty() {
            warn!("no chunks retrieved; generating with empty context");
        } else {
            debug!(retrieved = hits.len(), best = hits[0].score, "context retrieved");
        }

        // 3) Assemble context, closest first
        let context = prompt::build_context(&hits);
        let turns = [ChatTurn::user(prompt::build_user_prompt(question, &context))];

        // 4) Generate
        let outcome = self.generator.generate(prompt::SYSTEM_INSTRUCTION, &turns).await;

        // 5) Package
        let record = AnswerRecord {
            answer_text: outcome.text,
            status: outcome.status,
            retrieved_count: hits.len(),
            citations: hits.iter().map(Citation::from).collect(),
            source_snippets: hits.into_iter().map(|h| h.text).collect(),
            latency_ms: started.elapsed().as_millis() as u64,
        };

        if record.is_success() {
            info!(
                retrieved = record.retrieved_count,
                latency_ms = record.latency_ms,
                "answer generated"
            );
        } else {
            warn!(
                retrieved = record.retrieved_count,
                latency_ms = record.latency_ms,
                explanation = %record.answer_text,
                "answer degraded to error record"
            );
        }

        if let Some(path) = &self.settings.qa_log_path {
            let entry = QaLogEntry::from_answer(question, &record, "");
            if let Err(e) = append_qa_log(path, &entry).await {
                warn!(path = %path.display(), error = %e, "failed to append QA log");
            }
        }

        Ok(record)
    }

    /// Chunks a loaded document and indexes the result.
    ///
    /// A document without extractable text indexes nothing and returns `0`.
    pub async fn ingest_document(&self, pages: &[PageRecord]) -> Result<usize, PipelineError> {
        let chunks = self.chunker.chunk_document(pages);
        if chunks.is_empty() {
            let doc = pages.first().map(|p| p.meta.doc_id.as_str()).unwrap_or("?");
            warn!(doc_id = %doc, pages = pages.len(), "document has no extractable text; skipped");
            return Ok(0);
        }
        self.index(chunks).await
    }

    /// Deletes every stored chunk and recreates the index empty.
    pub async fn reset(&self) -> Result<(), PipelineError> {
        self.index.clear().await?;
        info!(backend = self.index.backend(), "index reset");
        Ok(())
    }

    pub async fn indexed_count(&self) -> Result<usize, PipelineError> {
        Ok(self.index.count().await?)
    }
}

fn validate_batch(chunks: &[Chunk]) -> Result<(), PipelineError> {
    if chunks.is_empty() {
        return Err(PipelineError::InvalidInput("no chunks to index".into()));
    }
    let mut seen = HashSet::with_capacity(chunks.len());
    for c in chunks {
        if c.id.trim().is_empty() {
            return Err(PipelineError::InvalidInput("chunk with empty id".into()));
        }
        if c.text.trim().is_empty() {
            return Err(PipelineError::InvalidInput(format!("chunk `{}` has empty text", c.id)));
        }
        if !seen.insert(c.id.as_str()) {
            return Err(PipelineError::InvalidInput(format!("duplicate chunk id `{}`", c.id)));
        }
    }
    Ok(())
}
