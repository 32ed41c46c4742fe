//! RefundPaymentHandler - Customer-initiated refund of a settled payment.

use std::sync::Arc;

use super::gateway_error;
use crate::application::{PaymentReconciler, ReconcileSource};
use crate::domain::foundation::{AuthenticatedUser, Money, OrderId};
use crate::domain::order::{OrderError, OrderPaymentStatus};
use crate::domain::payment::TransactionStatus;
use crate::ports::PaymentGateway;

#[derive(Debug, Clone)]
pub struct RefundPaymentCommand {
    pub user: AuthenticatedUser,
    pub payment_intent_id: String,
    pub order_id: OrderId,
    /// Partial refund in minor units; `None` refunds everything.
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundPaymentResult {
    pub success: bool,
    pub message: String,
    pub refund_id: Option<String>,
}

/// Handler for refunds.
///
/// Only orders that can still be cancelled are refundable here; once an
/// order is out for delivery, refunds go through the provider dashboard and
/// arrive as `charge.refunded` events.
pub struct RefundPaymentHandler {
    gateway: Arc<dyn PaymentGateway>,
    reconciler: Arc<PaymentReconciler>,
}

impl RefundPaymentHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, reconciler: Arc<PaymentReconciler>) -> Self {
        Self {
            gateway,
            reconciler,
        }
    }

    pub async fn handle(&self, cmd: RefundPaymentCommand) -> Result<RefundPaymentResult, OrderError> {
        let intent_id = cmd.payment_intent_id.trim();
        let amount = cmd
            .amount
            .map(|a| Money::positive("amount", a))
            .transpose()?;

        // 1. Local checks
        let order = self
            .reconciler
            .load_owned_order(cmd.order_id, &cmd.user)
            .await?;
        if order.payment_status != OrderPaymentStatus::Completed || !order.status.is_cancellable() {
            return Err(OrderError::invalid_state(
                format!("{} with payment {}", order.status, order.payment_status),
                "refund the order",
            ));
        }

        // The intent's own row; later attempts may have added newer rows.
        let transaction = self
            .reconciler
            .transaction_for_intent(&order, intent_id)
            .await?
            .filter(|tx| tx.status == TransactionStatus::Completed)
            .ok_or_else(|| {
                OrderError::invalid_state("without a completed payment", "refund the order")
            })?;
        if let Some(amount) = amount {
            if amount > transaction.amount {
                return Err(OrderError::validation(
                    "amount",
                    format!("Refund cannot exceed the paid amount of {}", transaction.amount),
                ));
            }
        }

        // 2. The intent must be this order's
        let intent = self
            .gateway
            .get_status(intent_id)
            .await
            .map_err(|e| gateway_error(intent_id, e))?;
        if intent.order_id() != Some(order.id) {
            tracing::warn!(order_id = %order.id, intent_id, "Refund requested for a foreign intent");
            return Err(OrderError::payment_not_found(intent_id));
        }

        // 3. Refund with the provider, then locally
        let outcome = self
            .gateway
            .refund(intent_id, amount)
            .await
            .map_err(|e| gateway_error(intent_id, e))?;
        if !outcome.success {
            tracing::info!(order_id = %order.id, intent_id, reason = %outcome.message, "Refund refused");
            return Ok(RefundPaymentResult {
                success: false,
                message: outcome.message,
                refund_id: None,
            });
        }

        self.reconciler
            .apply_refund(
                order,
                intent_id,
                outcome.refund_id.as_deref(),
                ReconcileSource::Customer,
            )
            .await?;

        Ok(RefundPaymentResult {
            success: true,
            message: "Refund processed".to_string(),
            refund_id: outcome.refund_id,
        })
    }
}
