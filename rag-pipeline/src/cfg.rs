//! Runtime configuration loaded from environment variables.
//!
//! Provider settings (models, endpoints, keys, temperature, timeout) are read
//! by `ai_llm_service::config::default_config`; this module covers retrieval,
//! chunking, storage and logging knobs.

use std::path::PathBuf;

use ai_llm_service::error_handler::env_opt_string;
use rag_store::{Chunker, DistanceKind, IndexConfig, QdrantConfig};

use crate::error::PipelineError;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_CHUNK_SIZE: usize = 800;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Config bag for the pipeline. All fields have defaults via `from_env`.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub index: IndexConfig,
    /// Expected embedding dimension; validated on every batch when set.
    pub embedding_dim: Option<usize>,
    /// Directory PDFs are resolved against when ingesting relative paths.
    pub raw_dir: PathBuf,
    /// Optional JSONL file receiving one QA log row per answer.
    pub qa_log_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            index: IndexConfig::Local {
                path: PathBuf::from("data/vector_store"),
            },
            embedding_dim: None,
            raw_dir: PathBuf::from("data/raw_papers"),
            qa_log_path: None,
        }
    }
}

impl PipelineConfig {
    /// Build from environment variables and validate.
    ///
    /// # Errors
    /// [`PipelineError::Config`] for unparsable numbers, an unknown
    /// `INDEX_BACKEND`, `top_k == 0`, or an invalid chunk window.
    pub fn from_env() -> Result<Self, PipelineError> {
        let backend = env("INDEX_BACKEND", "local").to_ascii_lowercase();
        let index = match backend.as_str() {
            "local" => IndexConfig::Local {
                path: PathBuf::from(env("INDEX_PATH", "data/vector_store")),
            },
            "qdrant" => IndexConfig::Qdrant(QdrantConfig {
                url: env("QDRANT_URL", "http://localhost:6334"),
                api_key: env_opt_string("QDRANT_API_KEY"),
                collection: env("QDRANT_COLLECTION", "papers"),
                distance: DistanceKind::Cosine,
                exact_search: parse("RAG_EXACT_SEARCH", false)?,
            }),
            other => {
                return Err(PipelineError::Config(format!(
                    "unsupported INDEX_BACKEND `{other}` (expected local|qdrant)"
                )));
            }
        };

        let cfg = Self {
            top_k: parse("RAG_TOP_K", DEFAULT_TOP_K)?,
            chunk_size: parse("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: parse("CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
            index,
            embedding_dim: parse_opt("EMBEDDING_DIM")?,
            raw_dir: PathBuf::from(env("RAW_DIR", "data/raw_papers")),
            qa_log_path: env_opt_string("QA_LOG_PATH").map(PathBuf::from),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.top_k == 0 {
            return Err(PipelineError::Config("RAG_TOP_K must be > 0".into()));
        }
        if self.embedding_dim == Some(0) {
            return Err(PipelineError::Config("EMBEDDING_DIM must be > 0".into()));
        }
        self.chunker()?;
        self.index
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Chunker for the configured window.
    pub fn chunker(&self) -> Result<Chunker, PipelineError> {
        Chunker::new(self.chunk_size, self.chunk_overlap)
            .map_err(|e| PipelineError::Config(e.to_string()))
    }
}

fn env(k: &str, dflt: &str) -> String {
    env_opt_string(k).unwrap_or_else(|| dflt.to_string())
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> Result<T, PipelineError> {
    Ok(parse_opt(k)?.unwrap_or(dflt))
}

fn parse_opt<T: std::str::FromStr>(k: &str) -> Result<Option<T>, PipelineError> {
    match env_opt_string(k) {
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| PipelineError::Config(format!("invalid value for {k}: `{v}`"))),
        None => Ok(None),
    }
}
