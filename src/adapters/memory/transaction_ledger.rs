//! In-memory transaction ledger.

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, Timestamp, TransactionId};
use crate::domain::payment::{NewTransaction, Transaction, TransactionStatus};
use crate::ports::TransactionLedger;

#[derive(Default)]
pub struct InMemoryTransactionLedger {
    rows: RwLock<Vec<Transaction>>,
    write_failures: Mutex<Vec<DomainError>>,
}

impl InMemoryTransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next write (insert or update) fail with `error`.
    pub async fn fail_next_write(&self, error: DomainError) {
        self.write_failures.lock().await.push(error);
    }

    pub async fn all_for_order(&self, order_id: OrderId) -> Vec<Transaction> {
        self.rows
            .read()
            .await
            .iter()
            .filter(|t| t.order_id == order_id)
            .cloned()
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.rows.read().await.len()
    }

    async fn injected_failure(&self) -> Result<(), DomainError> {
        match self.write_failures.lock().await.pop() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn duplicate_provider_id(rows: &[Transaction], provider_id: &str, except: Option<TransactionId>) -> bool {
        rows.iter().any(|t| {
            Some(t.id) != except && t.provider_transaction_id.as_deref() == Some(provider_id)
        })
    }
}

fn duplicate_error(provider_id: &str) -> DomainError {
    DomainError::new(
        ErrorCode::DuplicateProviderTransaction,
        format!("provider transaction {} is already recorded", provider_id),
    )
}

fn not_found(id: TransactionId) -> DomainError {
    DomainError::new(ErrorCode::TransactionNotFound, "Transaction not found")
        .with_detail("transaction_id", id.to_string())
}

#[async_trait]
impl TransactionLedger for InMemoryTransactionLedger {
    async fn find_by_order(&self, order_id: OrderId) -> Result<Option<Transaction>, DomainError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|t| t.order_id == order_id)
            .max_by_key(|t| (t.created_at, t.id))
            .cloned())
    }

    async fn find_by_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<Transaction>, DomainError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|t| t.is_for_intent(intent_id))
            .max_by_key(|t| (t.created_at, t.id))
            .cloned())
    }

    async fn insert(&self, transaction: NewTransaction) -> Result<Transaction, DomainError> {
        self.injected_failure().await?;
        let mut rows = self.rows.write().await;

        if let Some(provider_id) = transaction.provider_transaction_id.as_deref() {
            if Self::duplicate_provider_id(&rows, provider_id, None) {
                return Err(duplicate_error(provider_id));
            }
        }

        let id = TransactionId::new(rows.len() as i64 + 1)?;
        let row = Transaction::from_new(id, transaction, Timestamp::now());
        rows.push(row.clone());
        Ok(row)
    }

    async fn update_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        error_message: Option<String>,
    ) -> Result<Transaction, DomainError> {
        self.injected_failure().await?;
        let mut rows = self.rows.write().await;
        let row = rows.iter_mut().find(|t| t.id == id).ok_or_else(|| not_found(id))?;

        row.status = status;
        if error_message.is_some() {
            row.error_message = error_message;
        }
        row.updated_at = Timestamp::now();
        Ok(row.clone())
    }

    async fn update_with_provider_id(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        provider_transaction_id: &str,
        payment_method: Option<String>,
    ) -> Result<Transaction, DomainError> {
        self.injected_failure().await?;
        let mut rows = self.rows.write().await;

        if Self::duplicate_provider_id(&rows, provider_transaction_id, Some(id)) {
            return Err(duplicate_error(provider_transaction_id));
        }

        let row = rows.iter_mut().find(|t| t.id == id).ok_or_else(|| not_found(id))?;
        row.status = status;
        row.provider_transaction_id = Some(provider_transaction_id.to_string());
        if payment_method.is_some() {
            row.payment_method = payment_method;
        }
        row.updated_at = Timestamp::now();
        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Currency, Money, UserId};

    fn new_tx(order: i64, provider_id: Option<&str>, intent: &str) -> NewTransaction {
        NewTransaction {
            order_id: OrderId::new(order).unwrap(),
            user_id: UserId::new("alice").unwrap(),
            amount: Money::try_new("amount", 1999).unwrap(),
            currency: Currency::usd(),
            status: TransactionStatus::Pending,
            payment_method: None,
            provider_transaction_id: provider_id.map(str::to_string),
            payment_intent_id: Some(intent.to_string()),
            error_message: None,
        }
    }

    #[tokio::test]
    async fn provider_id_is_unique() {
        let ledger = InMemoryTransactionLedger::new();
        ledger.insert(new_tx(1, Some("ch_1"), "pi_1")).await.unwrap();

        let err = ledger.insert(new_tx(2, Some("ch_1"), "pi_2")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateProviderTransaction);

        let other = ledger.insert(new_tx(2, None, "pi_2")).await.unwrap();
        let err = ledger
            .update_with_provider_id(other.id, TransactionStatus::Completed, "ch_1", None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateProviderTransaction);
    }

    #[tokio::test]
    async fn find_by_order_returns_latest_attempt() {
        let ledger = InMemoryTransactionLedger::new();
        let first = ledger.insert(new_tx(1, None, "pi_1")).await.unwrap();
        ledger
            .update_status(first.id, TransactionStatus::Failed, Some("declined".into()))
            .await
            .unwrap();
        let second = ledger.insert(new_tx(1, None, "pi_2")).await.unwrap();

        let current = ledger.find_by_order(first.order_id).await.unwrap().unwrap();
        assert_eq!(current.id, second.id);
        assert_eq!(ledger.all_for_order(first.order_id).await.len(), 2);
    }

    #[tokio::test]
    async fn update_status_keeps_previous_error_when_none_given() {
        let ledger = InMemoryTransactionLedger::new();
        let tx = ledger.insert(new_tx(1, None, "pi_1")).await.unwrap();
        ledger
            .update_status(tx.id, TransactionStatus::Failed, Some("declined".into()))
            .await
            .unwrap();
        let row = ledger
            .update_status(tx.id, TransactionStatus::Completed, None)
            .await
            .unwrap();
        assert_eq!(row.error_message.as_deref(), Some("declined"));
    }
}
