//! Fine payment endpoints

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::transaction::{Invoice, PayFine, Transaction},
};

use super::AuthenticatedUser;

/// Pending fines with their total
#[derive(Serialize, ToSchema)]
pub struct PendingFinesResponse {
    pub fines: Vec<Transaction>,
    pub total_amount: Decimal,
}

/// Payment result with the derived invoice
#[derive(Serialize, ToSchema)]
pub struct PaymentResponse {
    pub message: String,
    pub payment: Transaction,
    pub fine: Transaction,
    pub invoice: Invoice,
}

/// List the caller's pending fines
#[utoipa::path(
    get,
    path = "/payment/fines/pending",
    tag = "payment",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending fines and their sum", body = PendingFinesResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn pending_fines(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<PendingFinesResponse>> {
    let (fines, total_amount) = state.services.payments.pending_fines(claims.sub).await?;

    Ok(Json(PendingFinesResponse {
        fines,
        total_amount,
    }))
}

/// Pay a pending fine
#[utoipa::path(
    post,
    path = "/payment/fines/pay",
    tag = "payment",
    security(("bearer_auth" = [])),
    request_body = PayFine,
    responses(
        (status = 200, description = "Payment processed", body = PaymentResponse),
        (status = 400, description = "Payment processing failed"),
        (status = 404, description = "Fine not found or already paid")
    )
)]
pub async fn pay_fine(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<PayFine>,
) -> AppResult<Json<PaymentResponse>> {
    let result = state
        .services
        .payments
        .process_payment(claims.sub, request.fine_id, request.payment_method)
        .await?;

    Ok(Json(PaymentResponse {
        message: "Payment processed successfully".to_string(),
        payment: result.payment,
        fine: result.fine,
        invoice: result.invoice,
    }))
}

/// List the caller's payment history
#[utoipa::path(
    get,
    path = "/payment/history",
    tag = "payment",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payments, newest first", body = Vec<Transaction>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn payment_history(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Transaction>>> {
    let payments = state.services.payments.payment_history(claims.sub).await?;
    Ok(Json(payments))
}
