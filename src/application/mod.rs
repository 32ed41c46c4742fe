//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers change orders and payments; query handlers read them.

pub mod handlers;
mod reconciler;

pub use handlers::*;
pub use reconciler::{PaymentReconciler, ReconcileOutcome, ReconcileSource, SettlementDetails};
