//! Per-client rate limiting middleware.
//!
//! Sliding-window limits keyed by the signed-in user, or one shared
//! `anonymous` bucket for requests without a valid token:
//! - 100 requests per minute
//! - 1000 requests per hour

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{bearer_token, ApiContext};

/// Unknown or expired tokens share the anonymous bucket.
fn rate_key(ctx: &ApiContext, req: &Request<axum::body::Body>) -> Result<String, ApiError> {
    let session = match bearer_token(req.headers().get("Authorization")) {
        Some(token) => ctx.core.validate_token(token)?,
        None => None,
    };
    Ok(session
        .map(|s| format!("user:{}", s.user_id))
        .unwrap_or_else(|| "anonymous".to_string()))
}

/// Returns 429 with `Retry-After` once a client is over its limit.
pub async fn limit(req: Request<axum::body::Body>, next: Next) -> Response {
    match limit_inner(req, next).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn limit_inner(req: Request<axum::body::Body>, next: Next) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let key = rate_key(&ctx, &req)?;

    // MutexGuard is !Send; scope it before .await
    {
        let mut limiter = ctx
            .rate_limiter
            .lock()
            .map_err(|_| ApiError::Internal("rate limiter lock".into()))?;

        limiter.check(&key).map_err(|retry_after| {
            tracing::warn!(key, retry_after, "Rate limit exceeded");
            ApiError::RateLimited { retry_after }
        })?;
    }

    Ok(next.run(req).await)
}
