//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the shop's order and payment domain.

mod auth;
mod errors;
mod ids;
mod money;
mod ownership;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser, Role};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{OrderId, OrderNumber, ProductId, TransactionId, UserId};
pub use money::{Currency, Money};
pub use ownership::OwnedByUser;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
