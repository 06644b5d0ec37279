use rag_store::Chunk;
use serde::{Deserialize, Serialize};

/// Request payload for /index: pre-chunked text with citation metadata.
#[derive(Debug, Deserialize)]
pub struct IndexRequest {
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    /// Chunks written by this call.
    pub indexed: usize,
    /// Chunks stored after the call.
    pub total: usize,
}
