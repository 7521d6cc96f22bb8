//! Borrow record models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::book::{Author, Category};

/// Borrow record from database. Open (active) iff return_date is null.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
}

/// Borrow record joined with its book for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowedBookDetails {
    pub id: Uuid,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub is_overdue: bool,
    pub book: BorrowedBookSummary,
}

/// The book side of a borrow listing
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowedBookSummary {
    pub id: Uuid,
    pub isbn: String,
    pub title: String,
    pub authors: Vec<Author>,
    pub categories: Vec<Category>,
}

/// Borrow request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BorrowBook {
    #[validate(length(equal = 13))]
    pub isbn: String,
}

/// Return request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReturnBook {
    pub borrowed_book_id: Uuid,
}
