//! Books repository for database operations

use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Author, Book, BookDetails, BookQuery, Category, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book row by ID (excluding soft-deleted books)
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Get book row by ID, including soft-deleted books (borrow history may
    /// reference books no longer in the catalog)
    pub async fn get_by_id_any(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Check whether another book already uses this ISBN
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND id != $2)")
                .bind(isbn)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
                .bind(isbn)
                .fetch_one(&self.pool)
                .await?
        };

        Ok(exists)
    }

    /// Create a book with its author/category associations in one transaction.
    /// Unknown authors and categories are created on the fly by name.
    pub async fn create(&self, book: &CreateBook) -> AppResult<Uuid> {
        let mut tx = self.pool.begin().await?;

        let book_id: Uuid = sqlx::query_scalar(
            "INSERT INTO books (isbn, title, copies) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(book.copies)
        .fetch_one(&mut *tx)
        .await?;

        for name in &book.authors {
            let author_id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO authors (name) VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT INTO book_authors (book_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(book_id)
            .bind(author_id)
            .execute(&mut *tx)
            .await?;
        }

        for name in &book.categories {
            let category_id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO categories (name) VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT INTO book_categories (book_id, category_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(book_id)
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(book_id)
    }

    /// Partially update a book; relink authors/categories when provided
    pub async fn update(&self, id: Uuid, update: &UpdateBook) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE books
            SET isbn = COALESCE($2, isbn),
                title = COALESCE($3, title),
                copies = COALESCE($4, copies)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.isbn)
        .bind(&update.title)
        .bind(update.copies)
        .execute(&mut *tx)
        .await?;

        if let Some(ref authors) = update.authors {
            sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            for name in authors {
                let author_id: Uuid = sqlx::query_scalar(
                    r#"
                    INSERT INTO authors (name) VALUES ($1)
                    ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                    RETURNING id
                    "#,
                )
                .bind(name)
                .fetch_one(&mut *tx)
                .await?;

                sqlx::query("INSERT INTO book_authors (book_id, author_id) VALUES ($1, $2)")
                    .bind(id)
                    .bind(author_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        if let Some(ref categories) = update.categories {
            sqlx::query("DELETE FROM book_categories WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            for name in categories {
                let category_id: Uuid = sqlx::query_scalar(
                    r#"
                    INSERT INTO categories (name) VALUES ($1)
                    ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                    RETURNING id
                    "#,
                )
                .bind(name)
                .fetch_one(&mut *tx)
                .await?;

                sqlx::query("INSERT INTO book_categories (book_id, category_id) VALUES ($1, $2)")
                    .bind(id)
                    .bind(category_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        Ok(())
    }

    /// Soft delete a book
    pub async fn soft_delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE books SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Book not found".to_string()));
        }

        Ok(())
    }

    /// Get book details with associations and derived availability
    pub async fn get_details(&self, id: Uuid) -> AppResult<BookDetails> {
        let row = sqlx::query(
            r#"
            SELECT b.*,
                   (SELECT COUNT(*) FROM borrowed_books bb
                    WHERE bb.book_id = b.id AND bb.return_date IS NULL) AS borrowed_count
            FROM books b
            WHERE b.id = $1 AND b.deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        let copies: i32 = row.get("copies");
        let borrowed_count: i64 = row.get("borrowed_count");

        Ok(BookDetails {
            id: row.get("id"),
            isbn: row.get("isbn"),
            title: row.get("title"),
            copies,
            authors: self.authors_for_book(id).await?,
            categories: self.categories_for_book(id).await?,
            available_copies: copies - borrowed_count as i32,
            borrowed_count,
            created_at: row.get("created_at"),
        })
    }

    /// Search the catalog; `available` filters on derived availability
    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<BookDetails>> {
        let mut sql = String::from(
            r#"
            SELECT b.*,
                   (SELECT COUNT(*) FROM borrowed_books bb
                    WHERE bb.book_id = b.id AND bb.return_date IS NULL) AS borrowed_count
            FROM books b
            WHERE b.deleted_at IS NULL
            "#,
        );

        let mut idx = 0;
        if query.isbn.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND b.isbn = ${}", idx));
        }
        if query.title.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND b.title ILIKE ${}", idx));
        }
        if query.author.is_some() {
            idx += 1;
            sql.push_str(&format!(
                r#" AND EXISTS (
                    SELECT 1 FROM book_authors ba
                    JOIN authors a ON a.id = ba.author_id
                    WHERE ba.book_id = b.id AND a.name ILIKE ${})"#,
                idx
            ));
        }
        if query.category.is_some() {
            idx += 1;
            sql.push_str(&format!(
                r#" AND EXISTS (
                    SELECT 1 FROM book_categories bc
                    JOIN categories c ON c.id = bc.category_id
                    WHERE bc.book_id = b.id AND c.name ILIKE ${})"#,
                idx
            ));
        }
        sql.push_str(" ORDER BY b.title");

        let mut q = sqlx::query(&sql);
        if let Some(ref isbn) = query.isbn {
            q = q.bind(isbn.clone());
        }
        if let Some(ref title) = query.title {
            q = q.bind(format!("%{}%", title));
        }
        if let Some(ref author) = query.author {
            q = q.bind(format!("%{}%", author));
        }
        if let Some(ref category) = query.category {
            q = q.bind(format!("%{}%", category));
        }

        let rows = q.fetch_all(&self.pool).await?;

        let mut result = Vec::new();
        for row in rows {
            let id: Uuid = row.get("id");
            let copies: i32 = row.get("copies");
            let borrowed_count: i64 = row.get("borrowed_count");
            let available_copies = copies - borrowed_count as i32;

            if let Some(available) = query.available {
                let has_copies = available_copies > 0;
                if available != has_copies {
                    continue;
                }
            }

            result.push(BookDetails {
                id,
                isbn: row.get("isbn"),
                title: row.get("title"),
                copies,
                authors: self.authors_for_book(id).await?,
                categories: self.categories_for_book(id).await?,
                available_copies,
                borrowed_count,
                created_at: row.get("created_at"),
            });
        }

        Ok(result)
    }

    /// Authors linked to a book
    pub async fn authors_for_book(&self, book_id: Uuid) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT a.id, a.name
            FROM authors a
            JOIN book_authors ba ON ba.author_id = a.id
            WHERE ba.book_id = $1
            ORDER BY a.name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    /// Categories linked to a book
    pub async fn categories_for_book(&self, book_id: Uuid) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name
            FROM categories c
            JOIN book_categories bc ON bc.category_id = c.id
            WHERE bc.book_id = $1
            ORDER BY c.name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}
