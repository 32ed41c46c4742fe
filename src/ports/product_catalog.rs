//! Read-only product catalog port.
//!
//! Checkout copies name and price from here into the order's line items.

use crate::domain::foundation::{DomainError, Money, ProductId};
use async_trait::async_trait;

/// A product as currently listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub is_available: bool,
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Looks up several products at once. Unknown ids are simply absent.
    async fn find_many(&self, ids: &[ProductId]) -> Result<Vec<CatalogProduct>, DomainError>;
}
