//! POST /ingest: load PDFs, chunk per page, index.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection, response::Response};
use rag_store::{LoadedDocument, load_pdf, load_pdfs_from_dir};
use tracing::{info, warn};

use crate::{
    core::{app_state::AppState, http::response_envelope::stored},
    error_handler::AppResult,
    routes::ingest::ingest_request::{IngestRequest, IngestResponse, IngestedDocument},
};

/// Handler: POST /ingest
///
/// A directory is ingested file by file in name order; the first unreadable
/// PDF aborts the call. Documents without text are reported with `chunks = 0`;
/// the reply is 201 once any chunk was stored.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(req) = payload?;
    let target = req.resolve(&state.raw_dir);

    let docs: Vec<LoadedDocument> = if target.is_dir() {
        load_pdfs_from_dir(&target).await?
    } else {
        vec![load_pdf(&target).await?]
    };
    if docs.is_empty() {
        warn!(path = %target.display(), "no PDFs found");
    }

    let mut documents = Vec::with_capacity(docs.len());
    for doc in docs {
        let chunks = state.pipeline.ingest_document(&doc.pages).await?;
        info!(doc_id = %doc.doc_id, pages = doc.pages.len(), chunks, "document ingested");
        documents.push(IngestedDocument {
            doc_id: doc.doc_id,
            source_path: doc.path.display().to_string(),
            pages: doc.pages.len(),
            chunks,
        });
    }

    let total_chunks = documents.iter().map(|d| d.chunks).sum();
    Ok(stored(total_chunks, IngestResponse {
        documents,
        total_chunks,
    }))
}
