//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `OrderRepository` - Orders with optimistic versioning
//! - `TransactionLedger` - Payment attempts per order
//! - `ProductCatalog` - Read-only prices for checkout snapshots
//! - `WebhookEventRepository` - Provider event idempotency tracking
//!
//! ## External Service Ports
//!
//! - `PaymentGateway` - Payment provider intent API
//! - `NotificationDispatcher` - Best-effort customer messages

mod notification_dispatcher;
mod order_repository;
mod payment_gateway;
mod product_catalog;
mod transaction_ledger;
mod webhook_event_repository;

pub use notification_dispatcher::{NotificationDispatcher, OrderNotification, OrderNotificationKind};
pub use order_repository::OrderRepository;
pub use payment_gateway::{
    ConfirmOutcome, CreateIntentRequest, PaymentError, PaymentErrorCode, PaymentGateway,
    PaymentIntent, RefundOutcome,
};
pub use product_catalog::{CatalogProduct, ProductCatalog};
pub use transaction_ledger::TransactionLedger;
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookOutcome,
};
