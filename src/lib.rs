//! Creamery - order and payment reconciliation for an online ice-cream shop.
//!
//! Customers place orders and pay through Stripe; this crate keeps the shop's
//! orders and payment ledger consistent with the provider across synchronous
//! confirmation, webhooks, status polling and refunds.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
