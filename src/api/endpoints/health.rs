use axum::Json;
use serde::Serialize;

use crate::api::types::ApiResponse;

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /api/health`: liveness check, no auth.
pub async fn check() -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse::ok(
        format!("{} API is running", crate::config::APP_NAME),
        HealthData {
            status: "ok",
            version: crate::config::APP_VERSION,
        },
    ))
}
