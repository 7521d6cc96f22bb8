//! Book catalog service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{BookDetails, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a book with ISBN deduplication
    pub async fn create_book(&self, book: CreateBook) -> AppResult<BookDetails> {
        if self.repository.books.isbn_exists(&book.isbn, None).await? {
            return Err(AppError::Conflict(
                "A book with this ISBN already exists".to_string(),
            ));
        }

        let book_id = self.repository.books.create(&book).await?;
        self.repository.books.get_details(book_id).await
    }

    /// Partially update a book; re-checks ISBN uniqueness when it changes
    pub async fn update_book(&self, id: Uuid, update: UpdateBook) -> AppResult<BookDetails> {
        let existing = self.repository.books.get_by_id(id).await?;

        if let Some(ref isbn) = update.isbn {
            if *isbn != existing.isbn && self.repository.books.isbn_exists(isbn, Some(id)).await? {
                return Err(AppError::Conflict(
                    "A book with this ISBN already exists".to_string(),
                ));
            }
        }

        self.repository.books.update(id, &update).await?;
        self.repository.books.get_details(id).await
    }

    /// Soft delete a book
    pub async fn delete_book(&self, id: Uuid) -> AppResult<()> {
        self.repository.books.soft_delete(id).await
    }

    /// Get a book with associations and availability
    pub async fn get_book(&self, id: Uuid) -> AppResult<BookDetails> {
        self.repository.books.get_details(id).await
    }

    /// Search the catalog
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Vec<BookDetails>> {
        self.repository.books.search(query).await
    }
}
