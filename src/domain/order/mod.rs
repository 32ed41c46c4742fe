//! Order domain module.
//!
//! - `aggregate` - Order aggregate and frozen line items
//! - `status` - Fulfillment and payment state machines
//! - `errors` - Caller-facing order errors

mod aggregate;
mod errors;
mod status;

pub use aggregate::{NewOrder, Order, OrderItem, RefundEffect, MAX_ITEM_QUANTITY, MAX_NOTES_LEN};
pub use errors::OrderError;
pub use status::{OrderPaymentStatus, OrderStatus};

#[cfg(test)]
pub(crate) use aggregate::test_support;
