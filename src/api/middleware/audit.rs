//! Audit logging middleware.
//!
//! One `tracing` line per API request with user id, method, path and
//! response status. Runs innermost, after auth has injected `AuthContext`.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::AuthContext;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let user_id = req
        .extensions()
        .get::<AuthContext>()
        .map(|a| a.user_id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    let response = next.run(req).await;

    tracing::info!(
        target: "medremind_lib::audit",
        user_id,
        method,
        path,
        status = response.status().as_u16(),
        "API access"
    );

    response
}
