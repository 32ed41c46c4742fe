//! PlaceOrderHandler - Command handler for checkout.
//!
//! Line items are snapshotted from the catalog at this point and never
//! re-read, so later price edits do not touch placed orders.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::foundation::{AuthenticatedUser, Currency, Money, ProductId};
use crate::domain::order::{NewOrder, Order, OrderError, OrderItem};
use crate::ports::{OrderRepository, ProductCatalog};

/// One requested line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: u32,
}

/// Command to place an order.
#[derive(Debug, Clone)]
pub struct PlaceOrderCommand {
    pub user: AuthenticatedUser,
    pub items: Vec<OrderLine>,
    /// Minor units.
    pub shipping_cost: i64,
    pub delivery_address_id: Option<i64>,
    pub notes: Option<String>,
}

/// Result of a successful checkout.
#[derive(Debug, Clone)]
pub struct PlaceOrderResult {
    pub order: Order,
}

pub struct PlaceOrderHandler {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn ProductCatalog>,
    currency: Currency,
}

impl PlaceOrderHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn ProductCatalog>,
        currency: Currency,
    ) -> Self {
        Self {
            orders,
            catalog,
            currency,
        }
    }

    pub async fn handle(&self, cmd: PlaceOrderCommand) -> Result<PlaceOrderResult, OrderError> {
        if cmd.items.is_empty() {
            return Err(OrderError::validation("items", "An order needs at least one item"));
        }
        let shipping_cost = Money::try_new("shipping_cost", cmd.shipping_cost)?;

        // 1. Look up every distinct product once
        let mut ids = Vec::with_capacity(cmd.items.len());
        for line in &cmd.items {
            let id = ProductId::new(line.product_id)?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        let products: HashMap<ProductId, _> = self
            .catalog
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        // 2. Snapshot name and price into line items
        let mut items = Vec::with_capacity(cmd.items.len());
        for line in &cmd.items {
            let id = ProductId::new(line.product_id)?;
            let product = products.get(&id).ok_or_else(|| {
                OrderError::validation("items", format!("Product {} does not exist", id))
            })?;
            if !product.is_available {
                return Err(OrderError::validation(
                    "items",
                    format!("{} is not available right now", product.name),
                ));
            }
            items.push(OrderItem::snapshot(
                product.id,
                product.name.clone(),
                line.quantity,
                product.price,
            )?);
        }

        // 3. Build and store the order
        let new_order = NewOrder::checkout(
            cmd.user.id.clone(),
            items,
            shipping_cost,
            self.currency.clone(),
            cmd.delivery_address_id,
            cmd.notes,
            cmd.user.email.clone(),
        )?;
        let order = self.orders.create(new_order).await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            user_id = %order.user_id,
            total = %order.total_amount,
            items = order.item_count(),
            "Order placed"
        );

        Ok(PlaceOrderResult { order })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryOrderRepository, InMemoryProductCatalog};
    use crate::domain::foundation::UserId;
    use crate::domain::order::{OrderPaymentStatus, OrderStatus};

    async fn handler() -> (PlaceOrderHandler, Arc<InMemoryOrderRepository>) {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let catalog = Arc::new(InMemoryProductCatalog::new());
        catalog.add(1, "Vanilla Bean", 450, true).await.unwrap();
        catalog.add(2, "Mint Chip", 399, true).await.unwrap();
        catalog.add(3, "Seasonal Pumpkin", 500, false).await.unwrap();
        (
            PlaceOrderHandler::new(orders.clone(), catalog, Currency::usd()),
            orders,
        )
    }

    fn command(items: Vec<(i64, u32)>) -> PlaceOrderCommand {
        PlaceOrderCommand {
            user: AuthenticatedUser::new(
                UserId::new("alice").unwrap(),
                Some("alice@example.com".to_string()),
                crate::domain::foundation::Role::Customer,
            ),
            items: items
                .into_iter()
                .map(|(product_id, quantity)| OrderLine {
                    product_id,
                    quantity,
                })
                .collect(),
            shipping_cost: 500,
            delivery_address_id: Some(3),
            notes: None,
        }
    }

    #[tokio::test]
    async fn places_pending_order_with_catalog_prices() {
        let (handler, orders) = handler().await;

        let result = handler.handle(command(vec![(1, 2), (2, 1)])).await.unwrap();

        let order = result.order;
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, OrderPaymentStatus::Pending);
        assert_eq!(order.total_amount.minor_units(), 450 * 2 + 399 + 500);
        assert_eq!(order.items[0].product_name, "Vanilla Bean");
        assert_eq!(order.contact_email.as_deref(), Some("alice@example.com"));
        assert_eq!(orders.count().await, 1);
    }

    #[tokio::test]
    async fn rejects_empty_unknown_and_unavailable_items() {
        let (handler, orders) = handler().await;

        for items in [vec![], vec![(42, 1)], vec![(3, 1)], vec![(1, 0)], vec![(1, 100)]] {
            let err = handler.handle(command(items)).await.unwrap_err();
            assert!(
                matches!(err, OrderError::ValidationFailed { .. }),
                "unexpected {:?}",
                err
            );
        }
        assert_eq!(orders.count().await, 0);
    }

    #[tokio::test]
    async fn rejects_negative_shipping_cost() {
        let (handler, _) = handler().await;
        let mut cmd = command(vec![(1, 1)]);
        cmd.shipping_cost = -1;

        let err = handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, OrderError::ValidationFailed { ref field, .. } if field == "shipping_cost"));
    }
}
