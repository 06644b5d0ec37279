//! POST /ask: answers a question from the indexed papers.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection, response::Response};
use tracing::debug;

use crate::{
    core::{app_state::AppState, http::response_envelope::ok},
    error_handler::{AppError, AppResult},
    routes::ask::ask_request::AskRequest,
};

/// Handler: POST /ask
///
/// Replies 200 with an `AnswerRecord` whenever one exists, including
/// `status = "error"` records from a failed or timed out generator.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/ask \
///   -H 'content-type: application/json' \
///   -d '{"question":"What is the main contribution?","doc_id":"2302.13971v1"}'
/// ```
pub async fn ask_question(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(body) = payload?;
    if body.question.trim().is_empty() {
        return Err(AppError::bad_request("question must not be empty", Some("question")));
    }

    let filter = body.rag_filter();
    debug!(filtered = filter.is_some(), "ask: start");
    let record = state.pipeline.answer(&body.question, filter.as_ref()).await?;
    Ok(ok(record))
}
