//! Data models for the Libris server

pub mod book;
pub mod borrow;
pub mod transaction;
pub mod user;

// Re-export commonly used types
pub use book::{Author, Book, BookDetails, Category};
pub use borrow::{BorrowRecord, BorrowedBookDetails};
pub use transaction::{Transaction, TransactionStatus, TransactionType};
pub use user::{Role, User, UserSummary};
