//! JSON envelope for every reply of the paper assistant API.
//!
//! Success: `{"success": true, "data": ...}`.
//! Failure: `{"success": false, "error": {"code", "message", "details"}}`.
//! Write endpoints (`/ingest`, `/index`) answer 201 when chunks were stored
//! and 200 when the call stored nothing.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Serialize)]
pub struct ApiError {
    /// Stable, machine-readable code (e.g. "EMBEDDING_FAILED").
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ApiErrorDetail>,
}

/// One pointer for the caller: the offending request field, a remedy, or both.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct ApiErrorDetail {
    /// Request field the error refers to, e.g. `question` or `chunks`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiErrorDetail {
    pub fn field(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            hint: None,
        }
    }

    pub fn hint(hint: impl Into<String>) -> Self {
        Self {
            path: None,
            hint: Some(hint.into()),
        }
    }
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl ApiResponse<()> {
    pub fn failure(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
                details: Vec::new(),
            }),
        }
    }

    /// Appends a detail to a failure; a no-op on success envelopes.
    pub fn with_detail(mut self, detail: ApiErrorDetail) -> Self {
        if let Some(err) = self.error.as_mut() {
            err.details.push(detail);
        }
        self
    }
}

/// 200 OK with `data` wrapped in the envelope.
pub fn ok<T: Serialize>(data: T) -> Response {
    ApiResponse::success(data).into_response_with_status(StatusCode::OK)
}

/// Reply of a write endpoint: 201 when `stored > 0` chunks landed in the index, else 200.
pub fn stored<T: Serialize>(stored: usize, data: T) -> Response {
    let status = if stored > 0 {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    ApiResponse::success(data).into_response_with_status(status)
}
