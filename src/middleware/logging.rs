//! Request logging middleware

use std::time::Instant;
use axum::{extract::Request, middleware::Next, response::Response};
use tracing::info;

/// Log method, path, status and latency for every request
pub async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request handled"
    );

    response
}
