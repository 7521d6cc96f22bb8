//! Libris Library Management Backend
//!
//! A REST JSON API for managing a library: user accounts with email
//! verification, a book catalog, borrow/return workflows, late fines
//! and payments, and admin analytics.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
