//! HTTP adapter for payment endpoints.
//!
//! - `POST /api/payments/intent` - Create a payment intent for an order
//! - `POST /api/payments/confirm` - Confirm an intent and settle the order
//! - `GET /api/payments/status/:intent_id` - Intent status (reconciles on read)
//! - `POST /api/payments/refund` - Refund a settled payment
//! - `GET /api/payments/available` - Whether checkout can take payments

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::payment_routes;
