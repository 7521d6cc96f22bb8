//! Borrow and return endpoints

use axum::{extract::State, http::StatusCode, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::borrow::{BorrowBook, BorrowRecord, ReturnBook},
};

use super::AuthenticatedUser;

/// Return response: the closed record and the fine, if any
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub returned_book: BorrowRecord,
    /// Fine amount when the return was late
    pub fine: Option<Decimal>,
}

/// Borrow a book by ISBN
#[utoipa::path(
    post,
    path = "/borrow",
    tag = "borrow",
    security(("bearer_auth" = [])),
    request_body = BorrowBook,
    responses(
        (status = 201, description = "Book borrowed", body = BorrowRecord),
        (status = 400, description = "Borrow limit reached or book already held"),
        (status = 403, description = "User not verified or inactive"),
        (status = 404, description = "Book not available")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BorrowBook>,
) -> AppResult<(StatusCode, Json<BorrowRecord>)> {
    request.validate()?;

    let record = state
        .services
        .borrows
        .borrow_book(claims.sub, &request.isbn)
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/borrow/return",
    tag = "borrow",
    security(("bearer_auth" = [])),
    request_body = ReturnBook,
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "Borrow record not found")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ReturnBook>,
) -> AppResult<Json<ReturnResponse>> {
    let outcome = state
        .services
        .borrows
        .return_book(claims.sub, request.borrowed_book_id)
        .await?;

    Ok(Json(ReturnResponse {
        returned_book: outcome.record,
        fine: outcome.fine.map(|f| f.amount),
    }))
}
