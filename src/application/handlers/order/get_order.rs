//! GetOrderHandler - Query handler for a customer's order.

use std::sync::Arc;

use crate::application::PaymentReconciler;
use crate::domain::foundation::{AuthenticatedUser, OrderId};
use crate::domain::order::{Order, OrderError};
use crate::domain::payment::Transaction;

/// Query to retrieve one order.
#[derive(Debug, Clone)]
pub struct GetOrderQuery {
    pub user: AuthenticatedUser,
    pub order_id: OrderId,
}

#[derive(Debug, Clone)]
pub struct GetOrderResult {
    pub order: Order,
    /// Most recent payment attempt, if any.
    pub transaction: Option<Transaction>,
}

pub struct GetOrderHandler {
    reconciler: Arc<PaymentReconciler>,
}

impl GetOrderHandler {
    pub fn new(reconciler: Arc<PaymentReconciler>) -> Self {
        Self { reconciler }
    }

    pub async fn handle(&self, query: GetOrderQuery) -> Result<GetOrderResult, OrderError> {
        let order = self
            .reconciler
            .load_owned_order(query.order_id, &query.user)
            .await?;
        let transaction = self.reconciler.current_transaction(order.id).await?;
        Ok(GetOrderResult { order, transaction })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryOrderRepository, InMemoryTransactionLedger, RecordingNotificationDispatcher,
    };
    use crate::domain::foundation::UserId;
    use crate::domain::order::test_support::pending_order;

    async fn handler() -> GetOrderHandler {
        let orders = Arc::new(InMemoryOrderRepository::new());
        orders.seed(pending_order(1001, "alice", 1999)).await;
        let reconciler = PaymentReconciler::new(
            orders,
            Arc::new(InMemoryTransactionLedger::new()),
            Arc::new(RecordingNotificationDispatcher::new()),
        );
        GetOrderHandler::new(Arc::new(reconciler))
    }

    fn query(user: &str, order: i64) -> GetOrderQuery {
        GetOrderQuery {
            user: AuthenticatedUser::customer(UserId::new(user).unwrap()),
            order_id: OrderId::new(order).unwrap(),
        }
    }

    #[tokio::test]
    async fn owner_sees_order() {
        let result = handler().await.handle(query("alice", 1001)).await.unwrap();
        assert_eq!(result.order.id.value(), 1001);
        assert!(result.transaction.is_none());
    }

    #[tokio::test]
    async fn foreign_and_missing_orders_look_the_same() {
        let handler = handler().await;
        let foreign = handler.handle(query("bob", 1001)).await.unwrap_err();
        let missing = handler.handle(query("alice", 4242)).await.unwrap_err();

        assert!(matches!(foreign, OrderError::NotFound(_)));
        assert!(matches!(missing, OrderError::NotFound(_)));
        assert_eq!(foreign.message(), missing.message());
    }
}
