//! Transaction ledger port.
//!
//! Plain persistence for payment attempts. The reconciler is the only
//! writer; business rules live there, not here. Implementations enforce
//! uniqueness of `provider_transaction_id` and report a clash as
//! `ErrorCode::DuplicateProviderTransaction`.

use crate::domain::foundation::{DomainError, OrderId, TransactionId};
use crate::domain::payment::{NewTransaction, Transaction, TransactionStatus};
use async_trait::async_trait;

#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// The current (most recently created) transaction of an order.
    async fn find_by_order(&self, order_id: OrderId) -> Result<Option<Transaction>, DomainError>;

    /// The transaction recording a given provider intent, if any.
    async fn find_by_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<Transaction>, DomainError>;

    async fn insert(&self, transaction: NewTransaction) -> Result<Transaction, DomainError>;

    /// Sets the status and, when given, the error message.
    async fn update_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        error_message: Option<String>,
    ) -> Result<Transaction, DomainError>;

    /// Sets status together with the provider-assigned transaction id.
    async fn update_with_provider_id(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        provider_transaction_id: &str,
        payment_method: Option<String>,
    ) -> Result<Transaction, DomainError>;
}
