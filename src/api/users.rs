//! User account endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        borrow::BorrowedBookDetails,
        transaction::Transaction,
        user::{UserQuery, UserSummary},
    },
};

use super::AuthenticatedUser;

/// A user's fines and the unpaid total
#[derive(Serialize, ToSchema)]
pub struct FinesResponse {
    pub fines: Vec<Transaction>,
    pub total_unpaid_fines: Decimal,
}

#[derive(Serialize, ToSchema)]
pub struct UserBorrowingStats {
    pub total_borrowed_books: i64,
    pub currently_borrowed: i64,
    pub returned_on_time: i64,
    pub returned_late: i64,
}

#[derive(Serialize, ToSchema)]
pub struct UserPaymentStats {
    pub total_fines: Decimal,
    pub total_paid: Decimal,
    pub pending_amount: Decimal,
}

#[derive(Serialize, ToSchema)]
pub struct UserStatistics {
    pub borrowing: UserBorrowingStats,
    pub payments: UserPaymentStats,
}

/// Full admin view of a user
#[derive(Serialize, ToSchema)]
pub struct UserDetailsResponse {
    pub user_info: UserSummary,
    pub current_borrowings: Vec<BorrowedBookDetails>,
    pub borrowing_history: Vec<BorrowedBookDetails>,
    pub transactions: Vec<Transaction>,
    pub statistics: UserStatistics,
}

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/users/profile",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile", body = UserSummary),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UserSummary>> {
    let user = state.services.users.get_profile(claims.sub).await?;
    Ok(Json(user))
}

/// List the caller's currently borrowed books
#[utoipa::path(
    get,
    path = "/users/borrowed-books",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Open borrows with book details", body = Vec<BorrowedBookDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_borrowed_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowedBookDetails>>> {
    let borrowed = state.services.borrows.borrowed_books(claims.sub).await?;
    Ok(Json(borrowed))
}

/// List the caller's fines and unpaid total
#[utoipa::path(
    get,
    path = "/users/fines",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fines and unpaid total", body = FinesResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_fines(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<FinesResponse>> {
    let fines = state.services.users.get_fines(claims.sub).await?;
    Ok(Json(fines))
}

/// List users with filters (admin only)
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "Matching users", body = Vec<UserSummary>),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Vec<UserSummary>>> {
    claims.require_admin()?;

    let users = state.services.users.list_users(&query).await?;
    Ok(Json(users))
}

/// Toggle a user's active status (admin only)
#[utoipa::path(
    patch,
    path = "/users/{id}/toggle-status",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Updated user", body = UserSummary),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn toggle_status(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserSummary>> {
    claims.require_admin()?;

    let user = state.services.users.toggle_status(id).await?;
    Ok(Json(user))
}

/// Full user details with statistics (admin only)
#[utoipa::path(
    get,
    path = "/users/{id}/details",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserDetailsResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_details(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserDetailsResponse>> {
    claims.require_admin()?;

    let details = state.services.users.admin_details(id).await?;
    Ok(Json(details))
}
