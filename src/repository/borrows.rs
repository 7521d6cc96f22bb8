//! Borrow/return repository: the transactional core of the borrow lifecycle.
//!
//! Every mutation here runs as a single database transaction. The book row is
//! locked with `SELECT ... FOR UPDATE` so concurrent borrows of the same book
//! serialize on the copy count and it can never go negative; the user row is
//! locked the same way so the per-user open-borrow count stays race-free.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::BorrowRecord,
        transaction::{Transaction, TransactionStatus, TransactionType},
    },
};

/// Maximum concurrently open borrows per user
pub const BORROW_LIMIT: i64 = 3;
/// Loan duration in days
pub const BORROW_DURATION_DAYS: i64 = 14;

/// Fine per day late (1.00)
pub fn fine_per_day() -> Decimal {
    Decimal::new(100, 2)
}

/// Whole days late, rounding any partial day up. Returning exactly on the
/// due date is not late.
pub fn days_late(due_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (now - due_date).num_seconds();
    if secs <= 0 {
        0
    } else {
        (secs + 86_399) / 86_400
    }
}

/// Outcome of a return: the closed record and the fine, if any
#[derive(Debug)]
pub struct ReturnOutcome {
    pub record: BorrowRecord,
    pub fine: Option<Transaction>,
}

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Borrow a book by ISBN for a user.
    ///
    /// Eligibility checks and the copy decrement happen atomically: the user
    /// must be verified and active, hold fewer than [`BORROW_LIMIT`] open
    /// borrows, the book must have a copy available, and the user must not
    /// already hold this book.
    pub async fn borrow(&self, user_id: Uuid, isbn: &str) -> AppResult<BorrowRecord> {
        let mut tx = self.pool.begin().await?;

        // Lock the user row so concurrent borrows by the same user serialize
        // and the open-borrow count below stays race-free
        let user_row = sqlx::query(
            "SELECT is_verified, is_active FROM users WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let eligible = user_row
            .map(|r| r.get::<bool, _>("is_verified") && r.get::<bool, _>("is_active"))
            .unwrap_or(false);
        if !eligible {
            return Err(AppError::Authorization(
                "User must be verified and active to borrow books".to_string(),
            ));
        }

        let active_borrows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowed_books WHERE user_id = $1 AND return_date IS NULL",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if active_borrows >= BORROW_LIMIT {
            return Err(AppError::BusinessRule(format!(
                "You cannot borrow more than {} books at a time",
                BORROW_LIMIT
            )));
        }

        // Lock the book row so concurrent borrows serialize on the copy count
        let book_row = sqlx::query(
            "SELECT id, copies FROM books WHERE isbn = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(isbn)
        .fetch_optional(&mut *tx)
        .await?;

        let (book_id, copies) = match book_row {
            Some(row) => (row.get::<Uuid, _>("id"), row.get::<i32, _>("copies")),
            None => return Err(AppError::NotFound("Book not available".to_string())),
        };

        if copies <= 0 {
            return Err(AppError::NotFound("Book not available".to_string()));
        }

        let already_borrowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrowed_books
                WHERE user_id = $1 AND book_id = $2 AND return_date IS NULL
            )
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_borrowed {
            return Err(AppError::BusinessRule(
                "You already have this book borrowed".to_string(),
            ));
        }

        let now = Utc::now();
        let due_date = now + Duration::days(BORROW_DURATION_DAYS);

        let record = sqlx::query_as::<_, BorrowRecord>(
            r#"
            INSERT INTO borrowed_books (user_id, book_id, borrow_date, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET copies = copies - 1 WHERE id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(record)
    }

    /// Return a borrowed book. Computes the overdue fine (creating a PENDING
    /// FINE transaction when days late > 0), closes the record and increments
    /// the copy count, all atomically.
    pub async fn return_book(&self, user_id: Uuid, borrowed_book_id: Uuid) -> AppResult<ReturnOutcome> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, BorrowRecord>(
            r#"
            SELECT * FROM borrowed_books
            WHERE id = $1 AND user_id = $2 AND return_date IS NULL
            FOR UPDATE
            "#,
        )
        .bind(borrowed_book_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Borrow record not found".to_string()))?;

        // Lock the book row before touching the copy count
        sqlx::query("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(record.book_id)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        let late = days_late(record.due_date, now);

        let fine = if late > 0 {
            let amount = Decimal::from(late) * fine_per_day();
            let fine = sqlx::query_as::<_, Transaction>(
                r#"
                INSERT INTO transactions (user_id, amount, type, status)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(user_id)
            .bind(amount)
            .bind(TransactionType::Fine)
            .bind(TransactionStatus::Pending)
            .fetch_one(&mut *tx)
            .await?;
            Some(fine)
        } else {
            None
        };

        let record = sqlx::query_as::<_, BorrowRecord>(
            "UPDATE borrowed_books SET return_date = $2 WHERE id = $1 RETURNING *",
        )
        .bind(borrowed_book_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET copies = copies + 1 WHERE id = $1")
            .bind(record.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(ReturnOutcome { record, fine })
    }

    /// Open borrows for a user, oldest first
    pub async fn open_for_user(&self, user_id: Uuid) -> AppResult<Vec<BorrowRecord>> {
        let records = sqlx::query_as::<_, BorrowRecord>(
            r#"
            SELECT * FROM borrowed_books
            WHERE user_id = $1 AND return_date IS NULL
            ORDER BY borrow_date
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Closed borrows for a user, most recent first
    pub async fn history_for_user(&self, user_id: Uuid) -> AppResult<Vec<BorrowRecord>> {
        let records = sqlx::query_as::<_, BorrowRecord>(
            r#"
            SELECT * FROM borrowed_books
            WHERE user_id = $1 AND return_date IS NOT NULL
            ORDER BY borrow_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn on_time_return_is_not_late() {
        let due = at(2025, 3, 10, 12, 0, 0);
        assert_eq!(days_late(due, due), 0);
        assert_eq!(days_late(due, at(2025, 3, 9, 12, 0, 0)), 0);
    }

    #[test]
    fn partial_day_rounds_up() {
        let due = at(2025, 3, 10, 12, 0, 0);
        assert_eq!(days_late(due, at(2025, 3, 10, 12, 0, 1)), 1);
        assert_eq!(days_late(due, at(2025, 3, 11, 11, 59, 59)), 1);
        assert_eq!(days_late(due, at(2025, 3, 11, 12, 0, 0)), 1);
        assert_eq!(days_late(due, at(2025, 3, 11, 12, 0, 1)), 2);
    }

    #[test]
    fn n_days_late_scales_fine() {
        let due = at(2025, 3, 10, 0, 0, 0);
        let now = at(2025, 3, 17, 0, 0, 1);
        let late = days_late(due, now);
        assert_eq!(late, 8);
        assert_eq!(Decimal::from(late) * fine_per_day(), Decimal::new(800, 2));
    }
}
