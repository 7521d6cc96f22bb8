//! Admin analytics service

use chrono::{DateTime, Datelike, TimeZone, Utc};
use rust_decimal::Decimal;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    api::analytics::{
        BorrowingStats, FinancialStats, MonthlyReport, MostBorrowedBook, MostBorrowedEntry,
        ReportPeriod, StatEntry, TrendEntry, UserStats,
    },
    error::AppResult,
    models::transaction::{TransactionStatus, TransactionType},
    repository::Repository,
};

/// First instant of the month containing `date` and first instant of the
/// following month (half-open window)
pub fn month_window(date: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc
        .with_ymd_and_hms(date.year(), date.month(), 1, 0, 0, 0)
        .unwrap();
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let end = Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).unwrap();
    (start, end)
}

/// Previous month's window relative to `date`
fn previous_month(date: DateTime<Utc>) -> DateTime<Utc> {
    let (start, _) = month_window(date);
    start - chrono::Duration::days(1)
}

#[derive(Clone)]
pub struct AnalyticsService {
    repository: Repository,
}

impl AnalyticsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow counts per book, optionally restricted to a date range
    pub async fn most_borrowed_books(
        &self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<MostBorrowedEntry>> {
        let pool = &self.repository.pool;

        let rows = match (start_date, end_date) {
            (Some(start), Some(end)) => {
                sqlx::query(
                    r#"
                    SELECT book_id, COUNT(*) AS borrow_count
                    FROM borrowed_books
                    WHERE borrow_date >= $1 AND borrow_date <= $2
                    GROUP BY book_id
                    ORDER BY borrow_count DESC
                    "#,
                )
                .bind(start)
                .bind(end)
                .fetch_all(pool)
                .await?
            }
            _ => {
                sqlx::query(
                    r#"
                    SELECT book_id, COUNT(*) AS borrow_count
                    FROM borrowed_books
                    GROUP BY book_id
                    ORDER BY borrow_count DESC
                    "#,
                )
                .fetch_all(pool)
                .await?
            }
        };

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let book_id: Uuid = row.get("book_id");
            let borrow_count: i64 = row.get("borrow_count");

            let book = self.repository.books.get_by_id_any(book_id).await?;
            let authors = self.repository.books.authors_for_book(book_id).await?;
            let categories = self.repository.books.categories_for_book(book_id).await?;

            result.push(MostBorrowedEntry {
                book_details: MostBorrowedBook {
                    id: book.id,
                    title: book.title,
                    isbn: book.isbn,
                    authors: authors.into_iter().map(|a| a.name).collect(),
                    categories: categories.into_iter().map(|c| c.name).collect(),
                },
                borrow_count,
            });
        }

        Ok(result)
    }

    /// Activity report for the month containing `month` (defaults to now)
    pub async fn monthly_report(&self, month: Option<DateTime<Utc>>) -> AppResult<MonthlyReport> {
        let pool = &self.repository.pool;
        let target = month.unwrap_or_else(Utc::now);
        let (start, end) = month_window(target);

        let total_borrows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowed_books WHERE borrow_date >= $1 AND borrow_date < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;

        let total_returns: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowed_books WHERE return_date >= $1 AND return_date < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;

        let overdue_books: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowed_books WHERE due_date < NOW() AND return_date IS NULL",
        )
        .fetch_one(pool)
        .await?;

        let new_users: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE created_at >= $1 AND created_at < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;

        let active_users: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT user_id) FROM borrowed_books
            WHERE borrow_date >= $1 AND borrow_date < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;

        let total_fines = self
            .transaction_sum(TransactionType::Fine, None, start, end)
            .await?;
        let total_payments = self
            .transaction_sum(
                TransactionType::Payment,
                Some(TransactionStatus::Completed),
                start,
                end,
            )
            .await?;

        let category_distribution = sqlx::query(
            r#"
            SELECT c.name AS label, COUNT(*) AS value
            FROM borrowed_books bb
            JOIN book_categories bc ON bc.book_id = bb.book_id
            JOIN categories c ON c.id = bc.category_id
            WHERE bb.borrow_date >= $1 AND bb.borrow_date < $2
            GROUP BY c.name
            ORDER BY value DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| StatEntry {
            label: row.get("label"),
            value: row.get("value"),
        })
        .collect();

        Ok(MonthlyReport {
            period: ReportPeriod {
                start_date: start,
                end_date: end,
                month: target.format("%B %Y").to_string(),
            },
            borrowing_stats: BorrowingStats {
                total_borrows,
                total_returns,
                overdue_books,
                category_distribution,
            },
            user_stats: UserStats {
                new_users,
                active_users,
            },
            financial_stats: FinancialStats {
                total_fines_generated: total_fines,
                total_payments_received: total_payments,
                pending_amount: total_fines - total_payments,
            },
        })
    }

    /// Borrow/return/fine totals for each of the last 12 calendar months
    pub async fn yearly_trends(&self) -> AppResult<Vec<TrendEntry>> {
        let pool = &self.repository.pool;

        let mut months = Vec::with_capacity(12);
        let mut cursor = Utc::now();
        for _ in 0..12 {
            months.push(month_window(cursor));
            cursor = previous_month(cursor);
        }
        months.reverse();

        let mut trends = Vec::with_capacity(12);
        for (start, end) in months {
            let borrows: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM borrowed_books WHERE borrow_date >= $1 AND borrow_date < $2",
            )
            .bind(start)
            .bind(end)
            .fetch_one(pool)
            .await?;

            let returns: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM borrowed_books WHERE return_date >= $1 AND return_date < $2",
            )
            .bind(start)
            .bind(end)
            .fetch_one(pool)
            .await?;

            let fines = self
                .transaction_sum(TransactionType::Fine, None, start, end)
                .await?;

            trends.push(TrendEntry {
                month: start.format("%B %Y").to_string(),
                borrows,
                returns,
                fines,
            });
        }

        Ok(trends)
    }

    async fn transaction_sum(
        &self,
        tx_type: TransactionType,
        status: Option<TransactionStatus>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Decimal> {
        let total: Decimal = if let Some(status) = status {
            sqlx::query_scalar(
                r#"
                SELECT COALESCE(SUM(amount), 0) FROM transactions
                WHERE type = $1 AND status = $2 AND created_at >= $3 AND created_at < $4
                "#,
            )
            .bind(tx_type)
            .bind(status)
            .bind(start)
            .bind(end)
            .fetch_one(&self.repository.pool)
            .await?
        } else {
            sqlx::query_scalar(
                r#"
                SELECT COALESCE(SUM(amount), 0) FROM transactions
                WHERE type = $1 AND created_at >= $2 AND created_at < $3
                "#,
            )
            .bind(tx_type)
            .bind(start)
            .bind(end)
            .fetch_one(&self.repository.pool)
            .await?
        };

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_window_covers_whole_month() {
        let date = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        let (start, end) = month_window(date);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn month_window_wraps_december() {
        let date = Utc.with_ymd_and_hms(2024, 12, 25, 0, 0, 0).unwrap();
        let (start, end) = month_window(date);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn previous_month_steps_back() {
        let date = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        let prev = previous_month(date);
        assert_eq!(prev.year(), 2024);
        assert_eq!(prev.month(), 12);
    }
}
