//! UpdateOrderStatusHandler - Staff moves an order along fulfillment.

use std::sync::Arc;

use crate::application::PaymentReconciler;
use crate::domain::foundation::{AuthenticatedUser, OrderId};
use crate::domain::order::{Order, OrderError, OrderStatus};
use crate::ports::{OrderNotificationKind, OrderRepository};

#[derive(Debug, Clone)]
pub struct UpdateOrderStatusCommand {
    pub user: AuthenticatedUser,
    pub order_id: OrderId,
    pub status: OrderStatus,
}

#[derive(Debug, Clone)]
pub struct UpdateOrderStatusResult {
    pub order: Order,
    pub previous_status: OrderStatus,
}

/// Handler for admin status changes.
///
/// `confirmed` is reserved for the payment flow and is rejected here.
/// Requesting the current status again is accepted without a write.
pub struct UpdateOrderStatusHandler {
    orders: Arc<dyn OrderRepository>,
    reconciler: Arc<PaymentReconciler>,
}

impl UpdateOrderStatusHandler {
    pub fn new(orders: Arc<dyn OrderRepository>, reconciler: Arc<PaymentReconciler>) -> Self {
        Self { orders, reconciler }
    }

    pub async fn handle(
        &self,
        cmd: UpdateOrderStatusCommand,
    ) -> Result<UpdateOrderStatusResult, OrderError> {
        if let Err(e) = cmd.user.require_admin() {
            tracing::warn!(user_id = %cmd.user.id, order_id = %cmd.order_id, error = %e, "Status change refused");
            return Err(OrderError::Forbidden);
        }

        let mut order = self
            .orders
            .find_by_id(cmd.order_id)
            .await?
            .ok_or_else(|| OrderError::not_found(cmd.order_id))?;
        let previous_status = order.status;

        if previous_status == cmd.status {
            return Ok(UpdateOrderStatusResult {
                order,
                previous_status,
            });
        }

        order.advance_fulfillment(cmd.status).map_err(|_| {
            OrderError::invalid_state(previous_status.to_string(), format!("move it to {}", cmd.status))
        })?;
        let order = self.orders.update(&order).await?;

        tracing::info!(
            order_id = %order.id,
            from = %previous_status,
            to = %order.status,
            changed_by = %cmd.user.id,
            "Order status changed"
        );
        self.reconciler
            .notify(
                &order,
                OrderNotificationKind::StatusChanged {
                    from: previous_status,
                    to: order.status,
                },
            )
            .await;

        Ok(UpdateOrderStatusResult {
            order,
            previous_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryOrderRepository, InMemoryTransactionLedger, RecordingNotificationDispatcher,
    };
    use crate::domain::foundation::{Role, UserId};
    use crate::domain::order::test_support::pending_order;

    struct Fixture {
        orders: Arc<InMemoryOrderRepository>,
        notifier: Arc<RecordingNotificationDispatcher>,
        handler: UpdateOrderStatusHandler,
    }

    async fn fixture(paid: bool) -> Fixture {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let mut order = pending_order(7, "alice", 1200);
        if paid {
            order.mark_paid(Some("card")).unwrap();
        }
        orders.seed(order).await;
        let notifier = Arc::new(RecordingNotificationDispatcher::new());
        let reconciler = Arc::new(PaymentReconciler::new(
            orders.clone(),
            Arc::new(InMemoryTransactionLedger::new()),
            notifier.clone(),
        ));
        Fixture {
            handler: UpdateOrderStatusHandler::new(orders.clone(), reconciler),
            orders,
            notifier,
        }
    }

    fn command(role: Role, status: OrderStatus) -> UpdateOrderStatusCommand {
        UpdateOrderStatusCommand {
            user: AuthenticatedUser::new(UserId::new("staff-1").unwrap(), None, role),
            order_id: OrderId::new(7).unwrap(),
            status,
        }
    }

    #[tokio::test]
    async fn admin_advances_paid_order_and_customer_is_told() {
        let f = fixture(true).await;

        let result = f
            .handler
            .handle(command(Role::Admin, OrderStatus::Preparing))
            .await
            .unwrap();

        assert_eq!(result.previous_status, OrderStatus::Confirmed);
        assert_eq!(result.order.status, OrderStatus::Preparing);
        let sent = f.notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].kind,
            OrderNotificationKind::StatusChanged {
                from: OrderStatus::Confirmed,
                to: OrderStatus::Preparing
            }
        );
    }

    #[tokio::test]
    async fn customers_cannot_change_status() {
        let f = fixture(true).await;
        let err = f
            .handler
            .handle(command(Role::Customer, OrderStatus::Preparing))
            .await
            .unwrap_err();
        assert_eq!(err, OrderError::Forbidden);
    }

    #[tokio::test]
    async fn staff_cannot_confirm_or_skip_ahead() {
        let f = fixture(false).await;

        for target in [OrderStatus::Confirmed, OrderStatus::Shipped] {
            let err = f.handler.handle(command(Role::Admin, target)).await.unwrap_err();
            assert!(matches!(err, OrderError::InvalidState { .. }), "{:?}", err);
        }
        let order = f.orders.get(OrderId::new(7).unwrap()).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(f.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn same_status_is_a_no_op() {
        let f = fixture(true).await;
        let result = f
            .handler
            .handle(command(Role::Admin, OrderStatus::Confirmed))
            .await
            .unwrap();
        assert_eq!(result.order.version, 1);
        assert!(f.notifier.sent().await.is_empty());
    }
}
