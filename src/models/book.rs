//! Book catalog models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub isbn: String,
    pub title: String,
    pub copies: i32,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// Book with associations and derived availability
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    pub id: Uuid,
    pub isbn: String,
    pub title: String,
    pub copies: i32,
    pub authors: Vec<Author>,
    pub categories: Vec<Category>,
    /// copies minus currently open borrows
    pub available_copies: i32,
    /// Number of currently open borrows
    pub borrowed_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(equal = 13))]
    pub isbn: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(range(min = 1))]
    pub copies: i32,
    /// Author names; created on the fly when unknown
    pub authors: Vec<String>,
    /// Category names; created on the fly when unknown
    pub categories: Vec<String>,
}

/// Partial book update request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(equal = 13))]
    pub isbn: Option<String>,
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(range(min = 0))]
    pub copies: Option<i32>,
    pub authors: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
}

/// Catalog search filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub isbn: Option<String>,
    /// Title substring (case-insensitive)
    pub title: Option<String>,
    /// Author name substring (case-insensitive)
    pub author: Option<String>,
    /// Category name substring (case-insensitive)
    pub category: Option<String>,
    /// true = only books with available copies, false = only exhausted ones
    pub available: Option<bool>,
}
