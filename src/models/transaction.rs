//! Fine/payment transaction models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

/// Transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Fine,
    Payment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Fine => "FINE",
            TransactionType::Payment => "PAYMENT",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FINE" => Ok(TransactionType::Fine),
            "PAYMENT" => Ok(TransactionType::Payment),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

/// Transaction lifecycle status. A FINE becomes COMPLETED only through a
/// successful payment referencing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionStatus::Pending),
            "COMPLETED" => Ok(TransactionStatus::Completed),
            "FAILED" => Ok(TransactionStatus::Failed),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

// Both enums are stored as TEXT
macro_rules! text_sqlx_type {
    ($ty:ty) => {
        impl sqlx::Type<Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }
        }

        impl<'r> Decode<'r, Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                let s: String = self.as_str().to_string();
                <String as Encode<Postgres>>::encode(s, buf)
            }
        }
    };
}

text_sqlx_type!(TransactionType);
text_sqlx_type!(TransactionStatus);

/// Payment method accepted at the desk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Upi,
    CreditCard,
    DebitCard,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Upi => "UPI",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::Cash => "CASH",
        }
    }
}

/// Transaction model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// Pay fine request
#[derive(Debug, Deserialize, ToSchema)]
pub struct PayFine {
    pub fine_id: Uuid,
    pub payment_method: PaymentMethod,
}

/// Derived payment receipt; never persisted
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Invoice {
    pub invoice_number: String,
    pub date: DateTime<Utc>,
    pub user_details: InvoiceUser,
    pub payment_details: InvoicePayment,
    pub fine_details: InvoiceFine,
    pub library_details: InvoiceLibrary,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvoiceUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvoicePayment {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_date: DateTime<Utc>,
    pub transaction_id: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvoiceFine {
    pub fine_id: Uuid,
    pub fine_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvoiceLibrary {
    pub name: String,
    pub address: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_enums_parse() {
        assert_eq!("FINE".parse::<TransactionType>().unwrap(), TransactionType::Fine);
        assert!("REFUND".parse::<TransactionType>().is_err());
        assert_eq!(
            "PENDING".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Pending
        );
        assert_eq!(TransactionStatus::Failed.as_str(), "FAILED");
    }

    #[test]
    fn payment_method_serde_names() {
        let m: PaymentMethod = serde_json::from_str("\"CREDIT_CARD\"").unwrap();
        assert_eq!(m, PaymentMethod::CreditCard);
        assert_eq!(serde_json::to_string(&PaymentMethod::Upi).unwrap(), "\"UPI\"");
    }
}
