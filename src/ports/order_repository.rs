//! Order repository port.
//!
//! # Concurrency
//!
//! Orders carry a `version`. `update` only succeeds when the stored version
//! still equals `order.version`; otherwise it fails with
//! `ErrorCode::ConcurrencyConflict` and nothing is written. On success the
//! returned order carries the bumped version.
//!
//! ```ignore
//! let mut order = repo.find_by_id(id).await?.ok_or(...)?;
//! if order.mark_paid(Some("card"))? {
//!     order = repo.update(&order).await?;
//! }
//! ```

use crate::domain::foundation::{DomainError, OrderId, UserId};
use crate::domain::order::{NewOrder, Order};
use async_trait::async_trait;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores a new order together with its line items, assigning its id.
    async fn create(&self, order: NewOrder) -> Result<Order, DomainError>;

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, DomainError>;

    /// Orders belonging to a user, newest first.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, DomainError>;

    /// Persists status, payment status and payment method.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order does not exist
    /// - `ConcurrencyConflict` if `order.version` is stale
    /// - `DatabaseError` on persistence failure
    async fn update(&self, order: &Order) -> Result<Order, DomainError>;
}
