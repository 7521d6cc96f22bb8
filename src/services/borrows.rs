//! Borrow/return service

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::borrow::{BorrowRecord, BorrowedBookDetails, BorrowedBookSummary},
    repository::{borrows::ReturnOutcome, Repository},
};

#[derive(Clone)]
pub struct BorrowsService {
    repository: Repository,
}

impl BorrowsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow a book by ISBN
    pub async fn borrow_book(&self, user_id: Uuid, isbn: &str) -> AppResult<BorrowRecord> {
        self.repository.borrows.borrow(user_id, isbn).await
    }

    /// Return a borrowed book, computing the overdue fine if any
    pub async fn return_book(
        &self,
        user_id: Uuid,
        borrowed_book_id: Uuid,
    ) -> AppResult<ReturnOutcome> {
        self.repository
            .borrows
            .return_book(user_id, borrowed_book_id)
            .await
    }

    /// The caller's open borrows with book details
    pub async fn borrowed_books(&self, user_id: Uuid) -> AppResult<Vec<BorrowedBookDetails>> {
        let records = self.repository.borrows.open_for_user(user_id).await?;
        self.with_book_details(records).await
    }

    /// The caller's closed borrows with book details, most recent first
    pub async fn borrowing_history(&self, user_id: Uuid) -> AppResult<Vec<BorrowedBookDetails>> {
        let records = self.repository.borrows.history_for_user(user_id).await?;
        self.with_book_details(records).await
    }

    async fn with_book_details(
        &self,
        records: Vec<BorrowRecord>,
    ) -> AppResult<Vec<BorrowedBookDetails>> {
        let now = Utc::now();

        let mut result = Vec::with_capacity(records.len());
        for record in records {
            let book = self.repository.books.get_by_id_any(record.book_id).await?;
            let authors = self.repository.books.authors_for_book(book.id).await?;
            let categories = self.repository.books.categories_for_book(book.id).await?;

            result.push(BorrowedBookDetails {
                id: record.id,
                borrow_date: record.borrow_date,
                due_date: record.due_date,
                return_date: record.return_date,
                is_overdue: record.return_date.is_none() && record.due_date < now,
                book: BorrowedBookSummary {
                    id: book.id,
                    isbn: book.isbn,
                    title: book.title,
                    authors,
                    categories,
                },
            });
        }

        Ok(result)
    }
}
