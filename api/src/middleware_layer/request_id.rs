use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::info;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Caller-supplied id when present and non-blank, otherwise `req-<nanos>`.
fn request_id_for(req: &Request<Body>) -> String {
    if let Some(v) = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        return v.to_string();
    }
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    format!("req-{nanos}")
}

/// Tags every request with an id, echoes it on the response and logs the outcome.
pub async fn request_id_layer(mut req: Request<Body>, next: Next) -> Response {
    let id = request_id_for(&req);
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let header = HeaderValue::from_str(&id).ok();
    if let Some(h) = &header {
        req.headers_mut().insert(REQUEST_ID_HEADER, h.clone());
    }

    let started = Instant::now();
    let mut res = next.run(req).await;

    info!(
        request_id = %id,
        %method,
        path = %path,
        status = res.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    if let Some(h) = header {
        res.headers_mut().insert(REQUEST_ID_HEADER, h);
    }
    res
}
