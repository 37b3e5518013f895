//! Medicine endpoints.
//!
//! - `POST /api/medicines`: create
//! - `GET /api/medicines`: paginated list with filters
//! - `GET /api/medicines/stats`: adherence statistics
//! - `GET|PUT|DELETE /api/medicines/:id`: single record

use std::str::FromStr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::adherence::{compute_stats, AdherenceStats};
use crate::api::error::ApiError;
use crate::api::types::{page_window, ApiContext, ApiResponse, AuthContext, Pagination};
use crate::db::{self, MedicineFilter};
use crate::medicines::{apply_edit, medicine_from_input, with_resolved_window};
use crate::models::enums::MedicineStatus;
use crate::models::{Medicine, MedicineInput};
use crate::validation::{validate_medicine_fields, FieldError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Field rules plus a reminder time, which the backend stores pre-formatted.
fn validate_submission(input: &MedicineInput) -> Result<(), ApiError> {
    let mut errors = validate_medicine_fields(input);
    if input.time.trim().is_empty() {
        errors.push(FieldError::new("time", "Reminder time is required"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.into())
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Medicine not found".into())
}

/// `POST /api/medicines`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<MedicineInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Medicine>>), ApiError> {
    let Json(input) = payload?;
    let clock = ctx.core.clock();
    let input = with_resolved_window(&input, clock.today());
    validate_submission(&input)?;

    let medicine = medicine_from_input(&input, clock.now(), clock.today());

    let conn = ctx.core.open_db()?;
    db::insert_medicine(&conn, &auth.user_id, &medicine)?;
    tracing::info!(user_id = %auth.user_id, medicine_id = %medicine.id, "Medicine created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Medicine created successfully", medicine)),
    ))
}

/// `GET /api/medicines`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<MedicineListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Medicine>>>, ApiError> {
    let Query(query) = query?;
    let (page, limit, offset) = page_window(query.page, query.limit);

    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            MedicineStatus::from_str(&s.to_lowercase())
                .map_err(|_| ApiError::BadRequest(format!("Unknown status filter: {s}")))
        })
        .transpose()?;

    let filter = MedicineFilter {
        search: query.search,
        start_date: query.start_date,
        end_date: query.end_date,
        status,
        today: ctx.core.clock().today(),
        limit,
        offset,
    };

    let conn = ctx.core.open_db()?;
    let medicines = db::list_medicines(&conn, &auth.user_id, &filter)?;
    let total = db::count_medicines(&conn, &auth.user_id, &filter)?;

    Ok(Json(ApiResponse::paged(
        "Medicines retrieved successfully",
        medicines,
        Pagination::new(page, limit, total),
    )))
}

/// `GET /api/medicines/stats`
pub async fn stats(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<AdherenceStats>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let records = db::all_medicines_for_user(&conn, &auth.user_id)?;
    let stats = compute_stats(&records, ctx.core.clock().today());
    Ok(Json(ApiResponse::ok("Statistics retrieved successfully", stats)))
}

/// `GET /api/medicines/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Medicine>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let medicine = db::get_medicine(&conn, &auth.user_id, &id)?.ok_or_else(not_found)?;
    Ok(Json(ApiResponse::ok("Medicine retrieved successfully", medicine)))
}

/// `PUT /api/medicines/:id`: overwrite editable fields; changes are
/// recorded in `lastEditedChanges`.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<MedicineInput>, JsonRejection>,
) -> Result<Json<ApiResponse<Medicine>>, ApiError> {
    let Json(input) = payload?;

    let conn = ctx.core.open_db()?;
    let mut medicine = db::get_medicine(&conn, &auth.user_id, &id)?.ok_or_else(not_found)?;

    let fallback_start = medicine.start_date.unwrap_or_else(|| ctx.core.clock().today());
    let input = with_resolved_window(&input, fallback_start);
    validate_submission(&input)?;

    if apply_edit(&mut medicine, &input, ctx.core.clock().now()) {
        if !db::update_medicine(&conn, &auth.user_id, &medicine)? {
            return Err(not_found());
        }
        tracing::info!(user_id = %auth.user_id, medicine_id = %medicine.id, "Medicine updated");
    }

    Ok(Json(ApiResponse::ok("Medicine updated successfully", medicine)))
}

/// `DELETE /api/medicines/:id`: removes the medicine and its logs.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let conn = ctx.core.open_db()?;
    if !db::delete_medicine(&conn, &auth.user_id, &id)? {
        return Err(not_found());
    }
    tracing::info!(user_id = %auth.user_id, medicine_id = %id, "Medicine deleted");
    Ok(Json(ApiResponse::message("Medicine deleted successfully")))
}
