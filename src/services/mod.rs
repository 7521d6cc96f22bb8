//! Business logic services

pub mod analytics;
pub mod auth;
pub mod borrows;
pub mod catalog;
pub mod email;
pub mod payments;
pub mod users;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub borrows: borrows::BorrowsService,
    pub payments: payments::PaymentsService,
    pub analytics: analytics::AnalyticsService,
    pub email: email::EmailService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> AppResult<Self> {
        let email = email::EmailService::new(config.email.clone());

        Ok(Self {
            auth: auth::AuthService::new(
                repository.clone(),
                config.auth.clone(),
                config.server.public_url.clone(),
                email.clone(),
            ),
            users: users::UsersService::new(repository.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            borrows: borrows::BorrowsService::new(repository.clone()),
            payments: payments::PaymentsService::new(repository.clone(), config.library.clone()),
            analytics: analytics::AnalyticsService::new(repository),
            email,
        })
    }
}
