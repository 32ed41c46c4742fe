//! In-memory adapters for tests and local development.
//!
//! They honour the same contracts as the Postgres adapters, including
//! optimistic versioning and provider-id uniqueness, and expose failure
//! injection so partial-write scenarios can be exercised.

mod order_repository;
mod support;
mod transaction_ledger;

pub use order_repository::InMemoryOrderRepository;
pub use support::{
    InMemoryProductCatalog, InMemoryWebhookEventRepository, RecordingNotificationDispatcher,
};
pub use transaction_ledger::InMemoryTransactionLedger;
