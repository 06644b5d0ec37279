use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rag_pipeline::PipelineError;
use rag_store::RagError;
use thiserror::Error;
use tracing::{error, warn};

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot ---
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("bad request: {message}")]
    BadRequest {
        message: String,
        path: Option<&'static str>,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, path: Option<&'static str>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            path,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Bind { .. } | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Pipeline(e) => match e {
                PipelineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                PipelineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
                PipelineError::Llm(_) => StatusCode::BAD_GATEWAY,
                PipelineError::Rag(r) => rag_status(r),
            },
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Bind { .. } => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest { .. } => "BAD_REQUEST",
            AppError::Pipeline(e) => match e {
                PipelineError::InvalidInput(_) => "INVALID_INPUT",
                PipelineError::Config(_) => "CONFIG_ERROR",
                PipelineError::Llm(_) => "LLM_ERROR",
                PipelineError::Rag(r) => match r {
                    RagError::Embedding(_) | RagError::VectorSizeMismatch { .. } => {
                        "EMBEDDING_FAILED"
                    }
                    RagError::Index(_) | RagError::Qdrant(_) | RagError::Json(_) => {
                        "RETRIEVAL_FAILED"
                    }
                    RagError::Pdf(_) => "PDF_UNREADABLE",
                    RagError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => "NOT_FOUND",
                    RagError::Io(_) => "IO_ERROR",
                    RagError::InvalidInput(_) => "INVALID_INPUT",
                    RagError::Config(_) => "CONFIG_ERROR",
                },
            },
        }
    }
}

impl AppError {
    /// Remedy shown to the caller next to the error, when one is known.
    fn hint(&self) -> Option<&'static str> {
        let AppError::Pipeline(e) = self else {
            return None;
        };
        match e {
            PipelineError::Rag(RagError::Embedding(_)) => {
                Some("the embedding provider did not answer; see GET /health")
            }
            PipelineError::Rag(RagError::VectorSizeMismatch { .. }) => {
                Some("the embedding model changed since indexing; POST /reset and ingest again")
            }
            PipelineError::Rag(RagError::Pdf(_)) => Some("the file is not a readable text PDF"),
            PipelineError::Rag(RagError::Io(io)) if io.kind() == std::io::ErrorKind::NotFound => {
                Some("relative paths are resolved against the raw document directory")
            }
            _ => None,
        }
    }
}

fn rag_status(err: &RagError) -> StatusCode {
    match err {
        RagError::Embedding(_)
        | RagError::VectorSizeMismatch { .. }
        | RagError::Index(_)
        | RagError::Qdrant(_)
        | RagError::Json(_) => StatusCode::BAD_GATEWAY,
        RagError::Pdf(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RagError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        RagError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
        RagError::Io(_) | RagError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.error_code(), error = %self, "request failed");
        } else {
            warn!(code = self.error_code(), error = %self, "request rejected");
        }

        let mut body = ApiResponse::failure(self.error_code(), self.to_string());
        if let AppError::BadRequest { path: Some(p), .. } = &self {
            body = body.with_detail(ApiErrorDetail::field(*p));
        }
        if let Some(hint) = self.hint() {
            body = body.with_detail(ApiErrorDetail::hint(hint));
        }
        body.into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::bad_request(err.body_text(), None)
    }
}

impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        AppError::Pipeline(PipelineError::Rag(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        let invalid: AppError = PipelineError::InvalidInput("no chunks".into()).into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let embed: AppError = RagError::Embedding("down".into()).into();
        assert_eq!(embed.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(embed.error_code(), "EMBEDDING_FAILED");

        let missing: AppError =
            RagError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")).into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let pdf: AppError = RagError::Pdf("bad xref".into()).into();
        assert_eq!(pdf.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn hints_point_at_the_remedy() {
        let resized: AppError = RagError::VectorSizeMismatch { got: 3, want: 4 }.into();
        assert!(resized.hint().unwrap().contains("/reset"));

        let missing: AppError =
            RagError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")).into();
        assert!(missing.hint().is_some());

        assert!(AppError::bad_request("empty", Some("question")).hint().is_none());
    }
}
