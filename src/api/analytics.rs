//! Admin analytics endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppResult;

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct StatEntry {
    pub label: String,
    pub value: i64,
}

#[derive(Serialize, ToSchema)]
pub struct MostBorrowedBook {
    pub id: Uuid,
    pub title: String,
    pub isbn: String,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MostBorrowedEntry {
    pub book_details: MostBorrowedBook,
    pub borrow_count: i64,
}

#[derive(Serialize, ToSchema)]
pub struct ReportPeriod {
    pub start_date: DateTime<Utc>,
    /// Exclusive end of the reporting window
    pub end_date: DateTime<Utc>,
    /// Human-readable month, e.g. "March 2025"
    pub month: String,
}

#[derive(Serialize, ToSchema)]
pub struct BorrowingStats {
    pub total_borrows: i64,
    pub total_returns: i64,
    pub overdue_books: i64,
    pub category_distribution: Vec<StatEntry>,
}

#[derive(Serialize, ToSchema)]
pub struct UserStats {
    pub new_users: i64,
    pub active_users: i64,
}

#[derive(Serialize, ToSchema)]
pub struct FinancialStats {
    pub total_fines_generated: Decimal,
    pub total_payments_received: Decimal,
    pub pending_amount: Decimal,
}

/// Monthly activity report
#[derive(Serialize, ToSchema)]
pub struct MonthlyReport {
    pub period: ReportPeriod,
    pub borrowing_stats: BorrowingStats,
    pub user_stats: UserStats,
    pub financial_stats: FinancialStats,
}

/// One month in the yearly trend series
#[derive(Serialize, ToSchema)]
pub struct TrendEntry {
    pub month: String,
    pub borrows: i64,
    pub returns: i64,
    pub fines: Decimal,
}

/// Optional date range filter
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DateRangeQuery {
    /// Range start (ISO 8601)
    pub start_date: Option<DateTime<Utc>>,
    /// Range end (ISO 8601)
    pub end_date: Option<DateTime<Utc>>,
}

/// Month selector
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    /// Any instant inside the month to report on (ISO 8601); defaults to now
    pub month: Option<DateTime<Utc>>,
}

/// Most borrowed books (admin only)
#[utoipa::path(
    get,
    path = "/analytics/books/most-borrowed",
    tag = "analytics",
    security(("bearer_auth" = [])),
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Borrow counts per book, descending", body = Vec<MostBorrowedEntry>),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn most_borrowed_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<MostBorrowedEntry>>> {
    claims.require_admin()?;

    let entries = state
        .services
        .analytics
        .most_borrowed_books(query.start_date, query.end_date)
        .await?;
    Ok(Json(entries))
}

/// Monthly activity report (admin only)
#[utoipa::path(
    get,
    path = "/analytics/reports/monthly",
    tag = "analytics",
    security(("bearer_auth" = [])),
    params(MonthQuery),
    responses(
        (status = 200, description = "Monthly report", body = MonthlyReport),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn monthly_report(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<MonthlyReport>> {
    claims.require_admin()?;

    let report = state.services.analytics.monthly_report(query.month).await?;
    Ok(Json(report))
}

/// Last 12 months of borrow/return/fine activity (admin only)
#[utoipa::path(
    get,
    path = "/analytics/reports/yearly-trends",
    tag = "analytics",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Monthly trend entries, oldest first", body = Vec<TrendEntry>),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn yearly_trends(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<TrendEntry>>> {
    claims.require_admin()?;

    let trends = state.services.analytics.yearly_trends().await?;
    Ok(Json(trends))
}
