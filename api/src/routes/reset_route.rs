//! POST /reset: drops every stored chunk.

use std::sync::Arc;

use axum::{extract::State, response::Response};
use serde::Serialize;

use crate::{
    core::{app_state::AppState, http::response_envelope::ok},
    error_handler::AppResult,
};

#[derive(Serialize)]
pub struct ResetResponse {
    pub backend: &'static str,
    pub remaining: usize,
}

pub async fn reset_index(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    state.pipeline.reset().await?;
    let remaining = state.pipeline.indexed_count().await?;
    Ok(ok(ResetResponse {
        backend: state.pipeline.index_backend(),
        remaining,
    }))
}
