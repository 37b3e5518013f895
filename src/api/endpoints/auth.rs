//! Account endpoints.
//!
//! `POST /api/auth/register`, `POST /api/auth/login`: unprotected
//! `POST /api/auth/logout`, `GET /api/auth/me`: bearer token required

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse, AuthContext};
use crate::crypto;
use crate::db;
use crate::models::User;
use crate::validation::FieldError;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_USER_NAME_LEN: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthData {
    pub user: User,
    pub token: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_registration(req: &RegisterRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let email = req.email.trim();
    if email.is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
    } else if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        errors.push(FieldError::new("email", "Email is invalid"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    let name = req.name.trim();
    if name.is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    } else if name.chars().count() > MAX_USER_NAME_LEN {
        errors.push(FieldError::new(
            "name",
            format!("Name is too long (max {MAX_USER_NAME_LEN} characters)"),
        ));
    }
    errors
}

/// `POST /api/auth/register`: create an account and sign in.
pub async fn register(
    State(ctx): State<ApiContext>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AuthData>>), ApiError> {
    let Json(req) = payload?;
    let errors = validate_registration(&req);
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let iterations = ctx.core.pbkdf2_iterations;
    let password = Zeroizing::new(req.password);
    let password_hash =
        tokio::task::spawn_blocking(move || crypto::hash_password(&password, iterations))
            .await
            .map_err(|e| ApiError::Internal(format!("hashing task: {e}")))??;

    let user = User {
        id: Uuid::new_v4(),
        email: normalize_email(&req.email),
        name: req.name.trim().to_string(),
        password_hash,
        created_at: ctx.core.clock().now(),
    };

    {
        let conn = ctx.core.open_db()?;
        db::insert_user(&conn, &user)?;
    }
    let token = ctx.core.issue_token(user.id, &user.email)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Registration successful", AuthData { user, token })),
    ))
}

/// `POST /api/auth/login`: exchange credentials for a bearer token.
pub async fn login(
    State(ctx): State<ApiContext>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AuthData>>, ApiError> {
    let Json(req) = payload?;
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::InvalidCredentials);
    }

    let user = {
        let conn = ctx.core.open_db()?;
        db::get_user_by_email(&conn, &email)?
    };
    let Some(user) = user else {
        tracing::warn!("Login failed: unknown account");
        return Err(ApiError::InvalidCredentials);
    };

    let stored = user.password_hash.clone();
    let password = Zeroizing::new(req.password);
    let valid = tokio::task::spawn_blocking(move || crypto::verify_password(&password, &stored))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task: {e}")))??;
    if !valid {
        tracing::warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = ctx.core.issue_token(user.id, &user.email)?;
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(ApiResponse::ok("Login successful", AuthData { user, token })))
}

/// `POST /api/auth/logout`: revoke the presented token.
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    ctx.core.revoke_token(&auth.token)?;
    tracing::info!(user_id = %auth.user_id, "User logged out");
    Ok(Json(ApiResponse::message("Logout successful")))
}

/// `GET /api/auth/me`: the signed-in user.
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let user = db::get_user(&conn, &auth.user_id)?.ok_or(ApiError::Unauthorized)?;
    Ok(Json(ApiResponse::ok("User retrieved", user)))
}
