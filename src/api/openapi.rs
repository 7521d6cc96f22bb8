//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{analytics, auth, books, borrow, health, payments, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "0.1.0",
        description = "Library Management REST Backend",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "Libris Team", email = "contact@libris.org")
    ),
    paths(
        // Health
        health::ping,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::verify_email,
        // Books
        books::search_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Borrow
        borrow::borrow_book,
        borrow::return_book,
        // Payment
        payments::pending_fines,
        payments::pay_fine,
        payments::payment_history,
        // Users
        users::get_profile,
        users::get_borrowed_books,
        users::get_fines,
        users::list_users,
        users::toggle_status,
        users::get_user_details,
        // Analytics
        analytics::most_borrowed_books,
        analytics::monthly_report,
        analytics::yearly_trends,
    ),
    components(
        schemas(
            // Health
            health::PingResponse,
            health::HealthResponse,
            // Auth
            auth::LoginResponse,
            auth::VerifyResponse,
            crate::models::user::RegisterUser,
            crate::models::user::LoginRequest,
            crate::models::user::UserSummary,
            crate::models::user::Role,
            crate::models::user::UserQuery,
            // Books
            crate::models::book::Book,
            crate::models::book::BookDetails,
            crate::models::book::Author,
            crate::models::book::Category,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::BookQuery,
            // Borrow
            crate::models::borrow::BorrowRecord,
            crate::models::borrow::BorrowedBookDetails,
            crate::models::borrow::BorrowedBookSummary,
            crate::models::borrow::BorrowBook,
            crate::models::borrow::ReturnBook,
            borrow::ReturnResponse,
            // Transactions
            crate::models::transaction::Transaction,
            crate::models::transaction::TransactionType,
            crate::models::transaction::TransactionStatus,
            crate::models::transaction::PaymentMethod,
            crate::models::transaction::PayFine,
            crate::models::transaction::Invoice,
            crate::models::transaction::InvoiceUser,
            crate::models::transaction::InvoicePayment,
            crate::models::transaction::InvoiceFine,
            crate::models::transaction::InvoiceLibrary,
            payments::PendingFinesResponse,
            payments::PaymentResponse,
            // Users
            users::FinesResponse,
            users::UserBorrowingStats,
            users::UserPaymentStats,
            users::UserStatistics,
            users::UserDetailsResponse,
            // Analytics
            analytics::StatEntry,
            analytics::MostBorrowedBook,
            analytics::MostBorrowedEntry,
            analytics::ReportPeriod,
            analytics::BorrowingStats,
            analytics::UserStats,
            analytics::FinancialStats,
            analytics::MonthlyReport,
            analytics::TrendEntry,
            analytics::DateRangeQuery,
            analytics::MonthQuery,
            // Errors
            crate::error::ErrorResponse,
            crate::error::ErrorDetail,
        )
    ),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "auth", description = "Registration, login and email verification"),
        (name = "books", description = "Book catalog"),
        (name = "borrow", description = "Borrow and return workflows"),
        (name = "payment", description = "Fines and payments"),
        (name = "users", description = "User accounts"),
        (name = "analytics", description = "Admin analytics")
    )
)]
pub struct ApiDoc;

/// Create the Swagger UI router serving the OpenAPI document
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
