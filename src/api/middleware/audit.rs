//! Audit logging middleware.
//!
//! Logs every request with user_id, method, path, response status and
//! latency. Runs inside the session loader so the caller is known.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::SessionContext;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let user_id = req
        .extensions()
        .get::<SessionContext>()
        .and_then(|s| s.user.as_ref().map(|u| u.id));
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match user_id {
        Some(user_id) => tracing::info!(%method, path = %path, %user_id, status, elapsed_ms, "request"),
        None => tracing::info!(%method, path = %path, status, elapsed_ms, "request"),
    }
    response
}
