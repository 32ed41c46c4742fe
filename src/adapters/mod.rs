//! Adapters - Implementations of port interfaces.
//!
//! - `http` - REST API (axum)
//! - `memory` - In-memory stores for tests and local runs
//! - `notification` - Customer e-mail (Resend) and log-only dispatch
//! - `postgres` - PostgreSQL stores (sqlx)
//! - `stripe` - Stripe PaymentIntents gateway and its test double

pub mod http;
pub mod memory;
pub mod notification;
pub mod postgres;
pub mod stripe;
