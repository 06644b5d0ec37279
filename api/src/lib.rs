//! HTTP surface of the paper assistant.
//!
//! Routes (all JSON, wrapped in [`ApiResponse`](core::http::response_envelope::ApiResponse)):
//! - `POST /ingest` load PDFs from a file or directory, chunk and index them
//! - `POST /index` index caller-built chunks
//! - `POST /ask` answer a question with citations
//! - `POST /reset` clear the index
//! - `GET /health` provider probes and index size

use std::sync::Arc;

use ai_llm_service::error_handler::env_opt_string;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info};

pub mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

pub use crate::core::app_state::AppState;
pub use error_handler::{AppError, AppResult};

use crate::middleware_layer::request_id::request_id_layer;
use crate::routes::{
    ask::ask_question_route::ask_question, health_route::health,
    index::index_chunks_route::index_chunks, ingest::ingest_route::ingest,
    reset_route::reset_index,
};

pub const DEFAULT_API_ADDRESS: &str = "127.0.0.1:8080";

/// Builds the application router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ingest", post(ingest))
        .route("/index", post(index_chunks))
        .route("/ask", post(ask_question))
        .route("/reset", post(reset_index))
        .route("/health", get(health))
        .layer(middleware::from_fn(request_id_layer))
        .with_state(state)
}

/// Binds `API_ADDRESS` (default [`DEFAULT_API_ADDRESS`]) and serves until Ctrl+C.
pub async fn start(state: AppState) -> Result<(), AppError> {
    let addr = env_opt_string("API_ADDRESS").unwrap_or_else(|| DEFAULT_API_ADDRESS.to_string());
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(%addr, "API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("API stopped");
    Ok(())
}

/// Resolves on Ctrl+C. If the signal cannot be installed the server keeps running.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ai_llm_service::{ChatTurn, LlmModelConfig, LlmProvider, LlmServiceProfiles};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use futures::{FutureExt, future::BoxFuture};
    use rag_pipeline::{AnswerGenerator, GenerationOutcome, PipelineSettings, RagPipeline};
    use rag_store::{Chunker, EmbeddingsProvider, LocalIndex, RagError};
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::middleware_layer::request_id::REQUEST_ID_HEADER;

    struct VowelEmbedder;

    impl EmbeddingsProvider for VowelEmbedder {
        fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>, RagError>> {
            async move {
                Ok(texts
                    .iter()
                    .map(|t| {
                        "aeiou"
                            .chars()
                            .map(|v| t.chars().filter(|c| c.eq_ignore_ascii_case(&v)).count() as f32 + 0.1)
                            .collect()
                    })
                    .collect())
            }
            .boxed()
        }
    }

    struct EchoGenerator;

    impl AnswerGenerator for EchoGenerator {
        fn generate<'a>(&'a self, _system: &'a str, turns: &'a [ChatTurn]) -> BoxFuture<'a, GenerationOutcome> {
            let n = turns.len();
            async move { GenerationOutcome::success(format!("answered from {n} turn(s)")) }.boxed()
        }
    }

    fn unreachable(model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.into(),
            endpoint: "http://127.0.0.1:9".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(1),
        }
    }

    async fn app() -> (TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(LocalIndex::open(dir.path().join("store")).await.unwrap());
        let pipeline = RagPipeline::new(
            Arc::new(VowelEmbedder),
            index,
            Arc::new(EchoGenerator),
            Chunker::new(100, 20).unwrap(),
            PipelineSettings {
                top_k: 3,
                qa_log_path: None,
            },
        )
        .unwrap();
        let llm = LlmServiceProfiles::new(unreachable("gen"), unreachable("emb"), Some(1)).unwrap();
        let state = AppState::new(Arc::new(pipeline), Arc::new(llm), dir.path().join("raw"));
        (dir, router(Arc::new(state)))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let res = tokio::time::timeout(Duration::from_secs(10), app.clone().oneshot(req))
            .await
            .unwrap()
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn chunk(id: &str, page: u32, text: &str) -> Value {
        json!({
            "id": id,
            "text": text,
            "metadata": { "doc_id": "paper", "source_name": "paper.pdf", "page_number": page }
        })
    }

    #[tokio::test]
    async fn index_then_ask_returns_cited_answer() {
        let (_dir, app) = app().await;
        let (status, body) = call(
            &app,
            "POST",
            "/index",
            Some(json!({ "chunks": [chunk("paper_0", 1, "aaaa attention"), chunk("paper_100", 2, "oooo")] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["indexed"], 2);
        assert_eq!(body["data"]["total"], 2);

        let (status, body) = call(&app, "POST", "/ask", Some(json!({ "question": "aaa?" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let data = &body["data"];
        assert_eq!(data["status"], "success");
        assert_eq!(data["retrieved_count"], 2);
        assert_eq!(data["citations"][0]["chunk_id"], "paper_0");
        assert_eq!(data["source_snippets"][0], "aaaa attention");

        let (_, body) = call(&app, "POST", "/ask", Some(json!({ "question": "aaa?", "filter": { "ranges": [{ "field": "page_number", "gte": 2 }] } }))).await;
        assert_eq!(body["data"]["retrieved_count"], 1);
        assert_eq!(body["data"]["citations"][0]["page_number"], 2);
    }

    #[tokio::test]
    async fn bad_requests_use_the_error_envelope() {
        let (_dir, app) = app().await;

        let (status, body) = call(&app, "POST", "/ask", Some(json!({ "question": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert_eq!(body["error"]["details"][0]["path"], "question");

        let (status, body) = call(&app, "POST", "/index", Some(json!({ "chunks": [] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");

        let (status, _) = call(&app, "POST", "/index", Some(json!({ "chunks": "nope" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ingest_of_missing_pdf_is_not_found() {
        let (_dir, app) = app().await;
        let (status, body) = call(&app, "POST", "/ingest", Some(json!({ "path": "missing.pdf" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert!(body["error"]["details"][0]["hint"].is_string());
    }

    #[tokio::test]
    async fn reset_empties_the_index() {
        let (_dir, app) = app().await;
        call(&app, "POST", "/index", Some(json!({ "chunks": [chunk("p_0", 1, "eee")] }))).await;
        let (status, body) = call(&app, "POST", "/reset", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["remaining"], 0);
        assert_eq!(body["data"]["backend"], "local");
    }

    #[tokio::test]
    async fn health_reports_unreachable_providers_without_failing() {
        let (_dir, app) = app().await;
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["ok"], false);
        assert_eq!(body["data"]["indexed_chunks"], 0);
        assert_eq!(body["data"]["providers"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let (_dir, app) = app().await;
        let req = Request::builder()
            .method("GET")
            .uri("/health")
            .header(REQUEST_ID_HEADER, "trace-7")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.headers()[REQUEST_ID_HEADER], "trace-7");
    }
}
