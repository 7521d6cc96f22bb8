//! Authentication endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{LoginRequest, RegisterUser, UserSummary},
};

/// Login response with bearer token
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub user: UserSummary,
}

/// Verification response
#[derive(Serialize, ToSchema)]
pub struct VerifyResponse {
    pub message: String,
    pub user: UserSummary,
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User registered, verification email sent", body = UserSummary),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<RegisterUser>,
) -> AppResult<(StatusCode, Json<UserSummary>)> {
    request.validate()?;

    let user = state.services.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Email not verified or account deactivated")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    request.validate()?;

    let (token, user) = state
        .services
        .auth
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        user,
    }))
}

/// Verify an email address from the emailed token
#[utoipa::path(
    get,
    path = "/auth/verify/{token}",
    tag = "auth",
    params(
        ("token" = String, Path, description = "Verification token")
    ),
    responses(
        (status = 200, description = "Email verified", body = VerifyResponse),
        (status = 400, description = "Invalid or expired token"),
        (status = 404, description = "User not found")
    )
)]
pub async fn verify_email(
    State(state): State<crate::AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<VerifyResponse>> {
    let user = state.services.auth.verify_email(&token).await?;

    Ok(Json(VerifyResponse {
        message: "Email verified successfully".to_string(),
        user,
    }))
}
