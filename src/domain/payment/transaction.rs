//! Transaction ledger entries.
//!
//! One row per settlement attempt. An order may accumulate a trail of failed
//! attempts; the most recently created row is the current one.

use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    Currency, Money, OrderId, StateMachine, Timestamp, TransactionId, UserId, ValidationError,
};
use serde::{Deserialize, Serialize};

/// Settlement state of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Refunded,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 6] = [
        TransactionStatus::Pending,
        TransactionStatus::Processing,
        TransactionStatus::Completed,
        TransactionStatus::Failed,
        TransactionStatus::Cancelled,
        TransactionStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
            TransactionStatus::Refunded => "refunded",
        }
    }

    /// Failed and cancelled attempts are history, not the live settlement.
    pub fn is_active(&self) -> bool {
        !matches!(self, TransactionStatus::Failed | TransactionStatus::Cancelled)
    }
}

impl StateMachine for TransactionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, target),
            (Pending, Processing)
                | (Pending, Completed)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Cancelled)
                // A late success for the same intent after a reported failure.
                | (Failed, Completed)
                | (Completed, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use TransactionStatus::*;
        match self {
            Pending => vec![Processing, Completed, Failed, Cancelled],
            Processing => vec![Completed, Failed, Cancelled],
            Failed => vec![Completed],
            Completed => vec![Refunded],
            Cancelled | Refunded => vec![],
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "transaction_status",
                    format!("unknown transaction status '{}'", s),
                )
            })
    }
}

/// A ledger row that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Money,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub payment_method: Option<String>,
    pub provider_transaction_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub error_message: Option<String>,
}

/// A stored ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Money,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub payment_method: Option<String>,
    pub provider_transaction_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Transaction {
    pub fn from_new(id: TransactionId, new: NewTransaction, now: Timestamp) -> Self {
        Self {
            id,
            order_id: new.order_id,
            user_id: new.user_id,
            amount: new.amount,
            currency: new.currency,
            status: new.status,
            payment_method: new.payment_method,
            provider_transaction_id: new.provider_transaction_id,
            payment_intent_id: new.payment_intent_id,
            error_message: new.error_message,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_for_intent(&self, intent_id: &str) -> bool {
        self.payment_intent_id.as_deref() == Some(intent_id)
    }
}
