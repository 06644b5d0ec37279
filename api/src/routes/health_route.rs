//! GET /health: provider probes plus index size.

use std::sync::Arc;

use ai_llm_service::HealthStatus;
use axum::{extract::State, response::Response};
use serde::Serialize;
use tracing::warn;

use crate::core::{app_state::AppState, http::response_envelope::ok};

#[derive(Serialize)]
pub struct HealthResponse {
    /// All providers reachable and the index readable.
    pub ok: bool,
    pub index_backend: &'static str,
    /// `None` when the index could not be read.
    pub indexed_chunks: Option<usize>,
    /// Generation profile first, then embedding.
    pub providers: Vec<HealthStatus>,
}

/// Always 200; the body carries the verdict.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let providers = state.llm.health_all().await;
    let indexed_chunks = match state.pipeline.indexed_count().await {
        Ok(n) => Some(n),
        Err(e) => {
            warn!(error = %e, "health: index count failed");
            None
        }
    };

    ok(HealthResponse {
        ok: indexed_chunks.is_some() && providers.iter().all(|p| p.ok),
        index_backend: state.pipeline.index_backend(),
        indexed_chunks,
        providers,
    })
}
