use std::path::PathBuf;
use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use rag_pipeline::RagPipeline;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The one pipeline instance built at startup.
    pub pipeline: Arc<RagPipeline>,
    /// Provider profiles, used by the health probe.
    pub llm: Arc<LlmServiceProfiles>,
    /// Directory relative ingest paths are resolved against.
    pub raw_dir: PathBuf,
}

impl AppState {
    pub fn new(
        pipeline: Arc<RagPipeline>,
        llm: Arc<LlmServiceProfiles>,
        raw_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pipeline,
            llm,
            raw_dir: raw_dir.into(),
        }
    }
}
