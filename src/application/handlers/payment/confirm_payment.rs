//! ConfirmPaymentHandler - Confirms an intent and reconciles the order.
//!
//! A decline is returned as `success: false` without touching the order or
//! the ledger; the provider's `payment_failed` event records it.

use std::sync::Arc;

use super::gateway_error;
use crate::application::{PaymentReconciler, ReconcileOutcome, ReconcileSource, SettlementDetails};
use crate::domain::foundation::{AuthenticatedUser, OrderId};
use crate::domain::order::{OrderError, OrderStatus};
use crate::domain::payment::PaymentIntentStatus;
use crate::ports::PaymentGateway;

#[derive(Debug, Clone)]
pub struct ConfirmPaymentCommand {
    pub user: AuthenticatedUser,
    pub payment_intent_id: String,
    pub order_id: OrderId,
    pub payment_method_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPaymentResult {
    pub success: bool,
    pub message: String,
    pub order_id: OrderId,
}

pub struct ConfirmPaymentHandler {
    gateway: Arc<dyn PaymentGateway>,
    reconciler: Arc<PaymentReconciler>,
}

impl ConfirmPaymentHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, reconciler: Arc<PaymentReconciler>) -> Self {
        Self {
            gateway,
            reconciler,
        }
    }

    pub async fn handle(
        &self,
        cmd: ConfirmPaymentCommand,
    ) -> Result<ConfirmPaymentResult, OrderError> {
        let intent_id = cmd.payment_intent_id.trim();
        if intent_id.is_empty() {
            return Err(OrderError::validation("payment_intent_id", "Payment intent id is required"));
        }

        // 1. Ownership, then the intent must belong to this order
        let order = self
            .reconciler
            .load_owned_order(cmd.order_id, &cmd.user)
            .await?;
        if order.status == OrderStatus::Cancelled {
            return Err(OrderError::invalid_state(
                order.status.to_string(),
                "confirm payment for the order",
            ));
        }

        let intent = self
            .gateway
            .get_status(intent_id)
            .await
            .map_err(|e| gateway_error(intent_id, e))?;
        if intent.order_id() != Some(order.id) {
            tracing::warn!(
                order_id = %order.id,
                intent_id,
                intent_order = ?intent.order_id(),
                "Intent does not belong to order"
            );
            return Err(OrderError::payment_not_found(intent_id));
        }

        // 2. Confirm with the provider
        let outcome = self
            .gateway
            .confirm(intent_id, cmd.payment_method_id.as_deref())
            .await
            .map_err(|e| gateway_error(intent_id, e))?;

        if !outcome.succeeded {
            let message = match (&outcome.decline_message, &outcome.intent.status) {
                (Some(reason), _) => reason.clone(),
                (None, PaymentIntentStatus::RequiresAction) => {
                    "Payment requires additional authentication".to_string()
                }
                (None, PaymentIntentStatus::Processing) => "Payment is processing".to_string(),
                (None, status) => format!("Payment was not completed ({})", status),
            };
            tracing::info!(
                order_id = %order.id,
                intent_id,
                status = %outcome.intent.status,
                "Payment confirmation did not succeed"
            );
            return Ok(ConfirmPaymentResult {
                success: false,
                message,
                order_id: order.id,
            });
        }

        // 3. Settle locally
        let reconciled = self
            .reconciler
            .apply_payment_success(
                order,
                SettlementDetails::from_intent(&outcome.intent),
                ReconcileSource::Customer,
            )
            .await?;

        let (success, message) = match reconciled {
            ReconcileOutcome::Applied | ReconcileOutcome::AlreadyApplied => {
                (true, "Payment confirmed".to_string())
            }
            ReconcileOutcome::Skipped(reason) | ReconcileOutcome::Unresolved(reason) => {
                (false, format!("Payment received but the order could not be confirmed: {}", reason))
            }
        };

        Ok(ConfirmPaymentResult {
            success,
            message,
            order_id: cmd.order_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryOrderRepository, InMemoryTransactionLedger, RecordingNotificationDispatcher,
    };
    use crate::adapters::stripe::MockPaymentGateway;
    use crate::domain::foundation::{Currency, Money, UserId};
    use crate::domain::order::test_support::pending_order;
    use crate::domain::order::OrderPaymentStatus;
    use crate::domain::payment::TransactionStatus;
    use crate::ports::CreateIntentRequest;
    use std::collections::HashMap;

    struct Fixture {
        gateway: MockPaymentGateway,
        orders: Arc<InMemoryOrderRepository>,
        ledger: Arc<InMemoryTransactionLedger>,
        notifier: Arc<RecordingNotificationDispatcher>,
        handler: ConfirmPaymentHandler,
    }

    async fn fixture() -> Fixture {
        let gateway = MockPaymentGateway::new();
        let orders = Arc::new(InMemoryOrderRepository::new());
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let notifier = Arc::new(RecordingNotificationDispatcher::new());
        orders.seed(pending_order(1001, "alice", 1999)).await;
        orders.seed(pending_order(1002, "alice", 500)).await;
        let reconciler = Arc::new(PaymentReconciler::new(
            orders.clone(),
            ledger.clone(),
            notifier.clone(),
        ));
        Fixture {
            handler: ConfirmPaymentHandler::new(Arc::new(gateway.clone()), reconciler),
            gateway,
            orders,
            ledger,
            notifier,
        }
    }

    async fn intent_for(gateway: &MockPaymentGateway, order: i64, amount: i64) -> String {
        gateway
            .create_intent(CreateIntentRequest {
                order_id: OrderId::new(order).unwrap(),
                amount: Money::try_new("amount", amount).unwrap(),
                currency: Currency::usd(),
                description: None,
                metadata: HashMap::new(),
            })
            .await
            .unwrap()
            .id
    }

    fn command(user: &str, intent: &str, order: i64) -> ConfirmPaymentCommand {
        ConfirmPaymentCommand {
            user: AuthenticatedUser::customer(UserId::new(user).unwrap()),
            payment_intent_id: intent.to_string(),
            order_id: OrderId::new(order).unwrap(),
            payment_method_id: Some("pm_card_visa".to_string()),
        }
    }

    #[tokio::test]
    async fn successful_confirm_settles_order_and_ledger() {
        let f = fixture().await;
        let intent = intent_for(&f.gateway, 1001, 1999).await;

        let result = f.handler.handle(command("alice", &intent, 1001)).await.unwrap();

        assert!(result.success);
        let order = f.orders.get(OrderId::new(1001).unwrap()).await.unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.payment_status, OrderPaymentStatus::Completed);
        let tx = f.ledger.all_for_order(order.id).await;
        assert_eq!(tx.len(), 1);
        assert_eq!(tx[0].status, TransactionStatus::Completed);
        assert!(tx[0].provider_transaction_id.as_deref().unwrap().starts_with("ch_"));
        assert_eq!(f.notifier.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn repeated_confirm_is_idempotent() {
        let f = fixture().await;
        let intent = intent_for(&f.gateway, 1001, 1999).await;

        f.handler.handle(command("alice", &intent, 1001)).await.unwrap();
        let again = f.handler.handle(command("alice", &intent, 1001)).await.unwrap();

        assert!(again.success);
        assert_eq!(f.ledger.count().await, 1);
        assert_eq!(f.notifier.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn decline_leaves_everything_pending() {
        let f = fixture().await;
        let intent = intent_for(&f.gateway, 1001, 1999).await;
        f.gateway.decline_next_confirm("Your card was declined.");

        let result = f.handler.handle(command("alice", &intent, 1001)).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.message, "Your card was declined.");
        let order = f.orders.get(OrderId::new(1001).unwrap()).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, OrderPaymentStatus::Pending);
        assert_eq!(f.ledger.count().await, 0);
    }

    #[tokio::test]
    async fn intent_for_another_order_is_not_found() {
        let f = fixture().await;
        let intent = intent_for(&f.gateway, 1002, 500).await;

        let err = f.handler.handle(command("alice", &intent, 1001)).await.unwrap_err();

        assert!(matches!(err, OrderError::PaymentNotFound(_)));
        assert!(!f.gateway.was_called("confirm"));
    }

    #[tokio::test]
    async fn foreign_order_is_checked_before_the_gateway() {
        let f = fixture().await;
        let intent = intent_for(&f.gateway, 1001, 1999).await;
        let before = f.gateway.calls().len();

        let err = f.handler.handle(command("mallory", &intent, 1001)).await.unwrap_err();

        assert!(matches!(err, OrderError::NotFound(_)));
        assert_eq!(f.gateway.calls().len(), before);
    }
}
