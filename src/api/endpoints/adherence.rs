//! Adherence log endpoints.
//!
//! - `POST /api/medicines/log`: record one taken/missed event
//! - `GET /api/medicines/logs`: events in an inclusive date range

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse, AuthContext};
use crate::db;
use crate::models::enums::LogStatus;
use crate::models::AdherenceLog;
use crate::validation::FieldError;

const MAX_LOG_NOTES_LEN: usize = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRequest {
    pub medicine_id: String,
    pub date: NaiveDate,
    pub status: LogStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// `POST /api/medicines/log`: a later event for the same date replaces
/// the earlier one.
pub async fn record(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<LogRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AdherenceLog>>, ApiError> {
    let Json(req) = payload?;

    let notes = req
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_LOG_NOTES_LEN) {
        return Err(vec![FieldError::new(
            "notes",
            format!("Notes is too long (max {MAX_LOG_NOTES_LEN} characters)"),
        )]
        .into());
    }

    let conn = ctx.core.open_db()?;
    if db::get_medicine(&conn, &auth.user_id, &req.medicine_id)?.is_none() {
        return Err(ApiError::NotFound("Medicine not found".into()));
    }

    let log = db::upsert_log(
        &conn,
        &AdherenceLog {
            id: Uuid::new_v4(),
            medicine_id: req.medicine_id,
            date: req.date,
            status: req.status,
            notes,
            created_at: ctx.core.clock().now(),
        },
    )?;
    tracing::info!(
        user_id = %auth.user_id,
        medicine_id = %log.medicine_id,
        date = %log.date,
        status = log.status.as_str(),
        "Adherence logged"
    );

    Ok(Json(ApiResponse::ok("Medicine log recorded successfully", log)))
}

/// `GET /api/medicines/logs`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<AdherenceLog>>>, ApiError> {
    let Query(query) = query?;
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if end < start {
            return Err(vec![FieldError::new("endDate", "End date cannot be before start date")].into());
        }
    }

    let conn = ctx.core.open_db()?;
    let logs = db::list_logs(&conn, &auth.user_id, query.start_date, query.end_date)?;
    Ok(Json(ApiResponse::ok("Medicine logs retrieved successfully", logs)))
}
