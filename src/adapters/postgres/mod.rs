//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresOrderRepository` - Orders and their frozen line items
//! - `PostgresTransactionLedger` - Payment attempts
//! - `PostgresProductCatalog` - Read-only product lookups
//! - `PostgresWebhookEventRepository` - Processed provider events

mod order_repository;
mod product_catalog;
mod transaction_ledger;
mod webhook_event_repository;

pub use order_repository::PostgresOrderRepository;
pub use product_catalog::PostgresProductCatalog;
pub use transaction_ledger::PostgresTransactionLedger;
pub use webhook_event_repository::PostgresWebhookEventRepository;

use crate::domain::foundation::{DomainError, ValidationError};

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, e))
}

/// A stored value that no longer passes domain validation.
fn corrupt(e: ValidationError) -> DomainError {
    DomainError::database(format!("Invalid stored value: {}", e))
}
