//! Domain layer - pure business logic with no infrastructure dependencies.
//!
//! - `foundation` - Shared value objects, identifiers, errors
//! - `order` - Order aggregate and its fulfillment/payment state machines
//! - `payment` - Transaction ledger rows and provider intent status
//! - `webhook` - Provider event verification and decoding

pub mod foundation;
pub mod order;
pub mod payment;
pub mod webhook;
