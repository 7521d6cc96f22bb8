//! User account service

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    api::users::{FinesResponse, UserBorrowingStats, UserDetailsResponse, UserPaymentStats, UserStatistics},
    error::AppResult,
    models::{
        transaction::TransactionStatus,
        user::{UserQuery, UserSummary},
    },
    repository::Repository,
    services::borrows::BorrowsService,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get a user's public profile
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<UserSummary> {
        Ok(self.repository.users.get_by_id(user_id).await?.into())
    }

    /// A user's FINE transactions and the sum of unpaid ones
    pub async fn get_fines(&self, user_id: Uuid) -> AppResult<FinesResponse> {
        let fines = self.repository.transactions.fines_for_user(user_id).await?;
        let total_unpaid = self
            .repository
            .transactions
            .unpaid_fine_total(user_id)
            .await?;

        Ok(FinesResponse {
            fines,
            total_unpaid_fines: total_unpaid,
        })
    }

    /// List users matching the admin filters
    pub async fn list_users(&self, query: &UserQuery) -> AppResult<Vec<UserSummary>> {
        self.repository.users.search(query).await
    }

    /// Flip a user's active flag
    pub async fn toggle_status(&self, user_id: Uuid) -> AppResult<UserSummary> {
        self.repository.users.toggle_status(user_id).await
    }

    /// Full admin view: profile, borrowings, transactions and statistics
    pub async fn admin_details(&self, user_id: Uuid) -> AppResult<UserDetailsResponse> {
        let user = self.get_profile(user_id).await?;

        let borrows = BorrowsService::new(self.repository.clone());
        let current_borrowings = borrows.borrowed_books(user_id).await?;
        let borrowing_history = borrows.borrowing_history(user_id).await?;

        let transactions = self.repository.transactions.fines_for_user(user_id).await?;
        let total_unpaid = self
            .repository
            .transactions
            .unpaid_fine_total(user_id)
            .await?;

        let returned_on_time = borrowing_history
            .iter()
            .filter(|b| b.return_date.map(|r| r <= b.due_date).unwrap_or(false))
            .count() as i64;
        let returned_late = borrowing_history
            .iter()
            .filter(|b| b.return_date.map(|r| r > b.due_date).unwrap_or(false))
            .count() as i64;

        let total_fines: Decimal = transactions.iter().map(|t| t.amount).sum();
        let total_paid: Decimal = transactions
            .iter()
            .filter(|t| t.status == TransactionStatus::Completed)
            .map(|t| t.amount)
            .sum();

        let statistics = UserStatistics {
            borrowing: UserBorrowingStats {
                total_borrowed_books: (borrowing_history.len() + current_borrowings.len()) as i64,
                currently_borrowed: current_borrowings.len() as i64,
                returned_on_time,
                returned_late,
            },
            payments: UserPaymentStats {
                total_fines,
                total_paid,
                pending_amount: total_unpaid,
            },
        };

        Ok(UserDetailsResponse {
            user_info: user,
            current_borrowings,
            borrowing_history,
            transactions,
            statistics,
        })
    }
}
