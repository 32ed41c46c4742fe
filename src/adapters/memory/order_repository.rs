//! In-memory order store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, Timestamp, UserId};
use crate::domain::order::{NewOrder, Order};
use crate::ports::OrderRepository;

/// Order store backed by a `HashMap`, with the same version semantics as
/// the Postgres adapter.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<OrderId, Order>>,
    next_id: AtomicI64,
    update_failures: Mutex<Vec<DomainError>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1000),
            update_failures: Mutex::new(Vec::new()),
        }
    }

    /// Makes the next `update` call fail with `error` without writing.
    pub async fn fail_next_update(&self, error: DomainError) {
        self.update_failures.lock().await.push(error);
    }

    /// Stores an order as-is, bypassing id assignment.
    pub async fn seed(&self, order: Order) {
        self.orders.write().await.insert(order.id, order);
    }

    pub async fn get(&self, id: OrderId) -> Option<Order> {
        self.orders.read().await.get(&id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        let raw = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = OrderId::new(raw)?;
        let order = order.into_order(id);

        let mut orders = self.orders.write().await;
        if orders.values().any(|o| o.order_number == order.order_number) {
            return Err(DomainError::database("duplicate order number"));
        }
        orders.insert(id, order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, DomainError> {
        let orders = self.orders.read().await;
        let mut owned: Vec<Order> = orders
            .values()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned)
    }

    async fn update(&self, order: &Order) -> Result<Order, DomainError> {
        if let Some(error) = self.update_failures.lock().await.pop() {
            return Err(error);
        }

        let mut orders = self.orders.write().await;
        let stored = orders.get_mut(&order.id).ok_or_else(|| {
            DomainError::new(ErrorCode::OrderNotFound, "Order not found")
                .with_detail("order_id", order.id.to_string())
        })?;

        if stored.version != order.version {
            return Err(DomainError::conflict(format!(
                "order {} is at version {}, update was based on {}",
                order.id, stored.version, order.version
            )));
        }

        stored.status = order.status;
        stored.payment_status = order.payment_status;
        stored.payment_method = order.payment_method.clone();
        stored.updated_at = Timestamp::now();
        stored.version += 1;
        Ok(stored.clone())
    }
}
