//! Transactions repository: fines and payments.
//!
//! Payment processing is atomic: the PENDING fine is locked, the PAYMENT row
//! is inserted and the fine flipped to COMPLETED in one transaction. If
//! anything fails after the fine is located, the transaction rolls back and a
//! FAILED payment row is recorded on the pool so it survives the rollback.

use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::transaction::{Transaction, TransactionStatus, TransactionType},
};

#[derive(Clone)]
pub struct TransactionsRepository {
    pool: Pool<Postgres>,
}

impl TransactionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// PENDING fines for a user, newest first
    pub async fn pending_fines(&self, user_id: Uuid) -> AppResult<Vec<Transaction>> {
        let fines = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE user_id = $1 AND type = $2 AND status = $3
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(TransactionType::Fine)
        .bind(TransactionStatus::Pending)
        .fetch_all(&self.pool)
        .await?;

        Ok(fines)
    }

    /// All FINE transactions for a user, newest first
    pub async fn fines_for_user(&self, user_id: Uuid) -> AppResult<Vec<Transaction>> {
        let fines = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE user_id = $1 AND type = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(TransactionType::Fine)
        .fetch_all(&self.pool)
        .await?;

        Ok(fines)
    }

    /// Sum of a user's PENDING fines
    pub async fn unpaid_fine_total(&self, user_id: Uuid) -> AppResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE user_id = $1 AND type = $2 AND status = $3
            "#,
        )
        .bind(user_id)
        .bind(TransactionType::Fine)
        .bind(TransactionStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// PAYMENT transactions for a user, newest first
    pub async fn payment_history(&self, user_id: Uuid) -> AppResult<Vec<Transaction>> {
        let payments = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE user_id = $1 AND type = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(TransactionType::Payment)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Process a payment against a PENDING fine.
    ///
    /// Returns the COMPLETED payment and the updated fine. The fine can only
    /// transition PENDING -> COMPLETED through this call.
    pub async fn process_payment(
        &self,
        user_id: Uuid,
        fine_id: Uuid,
    ) -> AppResult<(Transaction, Transaction)> {
        let mut tx = self.pool.begin().await?;

        let fine = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE id = $1 AND user_id = $2 AND type = $3 AND status = $4
            FOR UPDATE
            "#,
        )
        .bind(fine_id)
        .bind(user_id)
        .bind(TransactionType::Fine)
        .bind(TransactionStatus::Pending)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Fine not found or already paid".to_string()))?;

        // A payment gateway call would go here

        let settle = async {
            let payment = sqlx::query_as::<_, Transaction>(
                r#"
                INSERT INTO transactions (user_id, amount, type, status)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(user_id)
            .bind(fine.amount)
            .bind(TransactionType::Payment)
            .bind(TransactionStatus::Completed)
            .fetch_one(&mut *tx)
            .await?;

            let updated_fine = sqlx::query_as::<_, Transaction>(
                "UPDATE transactions SET status = $2 WHERE id = $1 RETURNING *",
            )
            .bind(fine_id)
            .bind(TransactionStatus::Completed)
            .fetch_one(&mut *tx)
            .await?;

            Ok::<_, AppError>((payment, updated_fine))
        }
        .await;

        match settle {
            Ok((payment, updated_fine)) => {
                tx.commit().await?;
                Ok((payment, updated_fine))
            }
            Err(e) => {
                tracing::error!("Payment for fine {} failed: {}", fine_id, e);
                tx.rollback().await.ok();
                // The FAILED row must survive the rollback; if even that
                // insert fails, the payment error still wins
                if let Err(insert_err) = self.record_failed_payment(user_id, fine.amount).await {
                    tracing::error!(
                        "Failed to record FAILED payment for fine {}: {}",
                        fine_id,
                        insert_err
                    );
                }
                Err(AppError::BusinessRule(
                    "Payment processing failed".to_string(),
                ))
            }
        }
    }

    /// Record a FAILED payment attempt outside any transaction
    async fn record_failed_payment(&self, user_id: Uuid, amount: Decimal) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (user_id, amount, type, status)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(TransactionType::Payment)
        .bind(TransactionStatus::Failed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
