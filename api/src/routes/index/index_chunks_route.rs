//! POST /index: raw indexing path for callers that chunk on their own.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection, response::Response};

use crate::{
    core::{app_state::AppState, http::response_envelope::stored},
    error_handler::AppResult,
    routes::index::index_request::{IndexRequest, IndexResponse},
};

/// Handler: POST /index. Replies 201 with the written and total chunk counts.
pub async fn index_chunks(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IndexRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(body) = payload?;
    let indexed = state.pipeline.index(body.chunks).await?;
    let total = state.pipeline.indexed_count().await?;
    Ok(stored(indexed, IndexResponse { indexed, total }))
}
