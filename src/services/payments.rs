//! Fine payment service

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    config::LibraryConfig,
    error::AppResult,
    models::transaction::{
        Invoice, InvoiceFine, InvoiceLibrary, InvoicePayment, InvoiceUser, PaymentMethod,
        Transaction,
    },
    repository::Repository,
};

/// Result of a processed payment
#[derive(Debug)]
pub struct PaymentResult {
    pub payment: Transaction,
    pub fine: Transaction,
    pub invoice: Invoice,
}

#[derive(Clone)]
pub struct PaymentsService {
    repository: Repository,
    library: LibraryConfig,
}

impl PaymentsService {
    pub fn new(repository: Repository, library: LibraryConfig) -> Self {
        Self { repository, library }
    }

    /// The caller's PENDING fines and their total
    pub async fn pending_fines(&self, user_id: Uuid) -> AppResult<(Vec<Transaction>, Decimal)> {
        let fines = self.repository.transactions.pending_fines(user_id).await?;
        let total = fines.iter().map(|f| f.amount).sum();
        Ok((fines, total))
    }

    /// Pay a PENDING fine and produce the derived invoice
    pub async fn process_payment(
        &self,
        user_id: Uuid,
        fine_id: Uuid,
        method: PaymentMethod,
    ) -> AppResult<PaymentResult> {
        let (payment, fine) = self
            .repository
            .transactions
            .process_payment(user_id, fine_id)
            .await?;

        let invoice = self.generate_invoice(user_id, &fine, &payment, method).await?;

        tracing::info!(
            "Payment {} completed for fine {} ({} via {})",
            payment.id,
            fine.id,
            payment.amount,
            method.as_str()
        );

        Ok(PaymentResult {
            payment,
            fine,
            invoice,
        })
    }

    /// The caller's payment history, newest first
    pub async fn payment_history(&self, user_id: Uuid) -> AppResult<Vec<Transaction>> {
        self.repository.transactions.payment_history(user_id).await
    }

    /// Build the derived receipt; nothing here is persisted
    async fn generate_invoice(
        &self,
        user_id: Uuid,
        fine: &Transaction,
        payment: &Transaction,
        method: PaymentMethod,
    ) -> AppResult<Invoice> {
        let user = self.repository.users.get_by_id(user_id).await?;
        let now = Utc::now();

        Ok(Invoice {
            invoice_number: invoice_number(now, payment.id),
            date: now,
            user_details: InvoiceUser {
                name: user.name,
                email: user.email,
            },
            payment_details: InvoicePayment {
                amount: fine.amount,
                payment_method: method,
                payment_date: payment.created_at,
                transaction_id: payment.id,
            },
            fine_details: InvoiceFine {
                fine_id: fine.id,
                fine_date: fine.created_at,
            },
            library_details: InvoiceLibrary {
                name: self.library.name.clone(),
                address: self.library.address.clone(),
                email: self.library.email.clone(),
            },
            status: "PAID".to_string(),
        })
    }
}

/// `INV-YYYYMMDD-` followed by the first 8 hex digits of the payment ID
fn invoice_number(date: chrono::DateTime<Utc>, payment_id: Uuid) -> String {
    let id_hex = payment_id.simple().to_string();
    format!("INV-{}-{}", date.format("%Y%m%d"), &id_hex[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn invoice_number_format() {
        let date = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        let id = Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000000").unwrap();
        assert_eq!(invoice_number(date, id), "INV-20250314-a1b2c3d4");
    }
}
