//! PostgreSQL implementation of TransactionLedger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{
    Currency, DomainError, ErrorCode, Money, OrderId, Timestamp, TransactionId, UserId,
};
use crate::domain::payment::{NewTransaction, Transaction, TransactionStatus};
use crate::ports::TransactionLedger;

use super::{corrupt, db_error};

const PROVIDER_ID_CONSTRAINT: &str = "transactions_provider_transaction_id_key";

pub struct PostgresTransactionLedger {
    pool: PgPool,
}

impl PostgresTransactionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    order_id: i64,
    user_id: String,
    amount: i64,
    currency: String,
    status: String,
    payment_method: Option<String>,
    provider_transaction_id: Option<String>,
    payment_intent_id: Option<String>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = DomainError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            id: TransactionId::new(row.id).map_err(corrupt)?,
            order_id: OrderId::new(row.order_id).map_err(corrupt)?,
            user_id: UserId::new(row.user_id).map_err(corrupt)?,
            amount: Money::try_new("amount", row.amount).map_err(corrupt)?,
            currency: row.currency.parse::<Currency>().map_err(corrupt)?,
            status: row.status.parse::<TransactionStatus>().map_err(corrupt)?,
            payment_method: row.payment_method,
            provider_transaction_id: row.provider_transaction_id,
            payment_intent_id: row.payment_intent_id,
            error_message: row.error_message,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const COLUMNS: &str = r#"
    id, order_id, user_id, amount, currency, status, payment_method,
    provider_transaction_id, payment_intent_id, error_message, created_at, updated_at
"#;

/// Maps the provider-id unique index to its own error code.
fn write_error(context: &str, provider_id: Option<&str>, e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.constraint() == Some(PROVIDER_ID_CONSTRAINT) {
            return DomainError::new(
                ErrorCode::DuplicateProviderTransaction,
                format!(
                    "provider transaction {} is already recorded",
                    provider_id.unwrap_or("?")
                ),
            );
        }
    }
    db_error(context, e)
}

fn not_found(id: TransactionId) -> DomainError {
    DomainError::new(ErrorCode::TransactionNotFound, "Transaction not found")
        .with_detail("transaction_id", id.to_string())
}

#[async_trait]
impl TransactionLedger for PostgresTransactionLedger {
    async fn find_by_order(&self, order_id: OrderId) -> Result<Option<Transaction>, DomainError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE order_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
            COLUMNS
        ))
        .bind(order_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch transaction", e))?;

        row.map(Transaction::try_from).transpose()
    }

    async fn find_by_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<Transaction>, DomainError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE payment_intent_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
            COLUMNS
        ))
        .bind(intent_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch transaction", e))?;

        row.map(Transaction::try_from).transpose()
    }

    async fn insert(&self, transaction: NewTransaction) -> Result<Transaction, DomainError> {
        let row: TransactionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO transactions (
                order_id, user_id, amount, currency, status, payment_method,
                provider_transaction_id, payment_intent_id, error_message
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(transaction.order_id.value())
        .bind(transaction.user_id.as_str())
        .bind(transaction.amount.minor_units())
        .bind(transaction.currency.as_str())
        .bind(transaction.status.as_str())
        .bind(&transaction.payment_method)
        .bind(&transaction.provider_transaction_id)
        .bind(&transaction.payment_intent_id)
        .bind(&transaction.error_message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            write_error(
                "Failed to save transaction",
                transaction.provider_transaction_id.as_deref(),
                e,
            )
        })?;

        row.try_into()
    }

    async fn update_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        error_message: Option<String>,
    ) -> Result<Transaction, DomainError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            r#"
            UPDATE transactions SET
                status = $2,
                error_message = COALESCE($3, error_message),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id.value())
        .bind(status.as_str())
        .bind(&error_message)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update transaction", e))?;

        row.ok_or_else(|| not_found(id))?.try_into()
    }

    async fn update_with_provider_id(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        provider_transaction_id: &str,
        payment_method: Option<String>,
    ) -> Result<Transaction, DomainError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            r#"
            UPDATE transactions SET
                status = $2,
                provider_transaction_id = $3,
                payment_method = COALESCE($4, payment_method),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id.value())
        .bind(status.as_str())
        .bind(provider_transaction_id)
        .bind(&payment_method)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            write_error(
                "Failed to update transaction",
                Some(provider_transaction_id),
                e,
            )
        })?;

        row.ok_or_else(|| not_found(id))?.try_into()
    }
}
