//! Payment domain module.
//!
//! - `transaction` - Ledger rows and their settlement state machine
//! - `intent_status` - Provider intent status and the order-status lookup

mod intent_status;
mod transaction;

pub use intent_status::PaymentIntentStatus;
pub use transaction::{NewTransaction, Transaction, TransactionStatus};
