//! GetPaymentStatusHandler - Reads an intent and nudges its order.
//!
//! Polling doubles as a reconciliation path: a succeeded intent whose
//! webhook has not arrived yet confirms the order here.

use std::collections::HashMap;
use std::sync::Arc;

use super::gateway_error;
use crate::application::{PaymentReconciler, ReconcileOutcome, ReconcileSource, SettlementDetails};
use crate::domain::foundation::{AuthenticatedUser, OrderId};
use crate::domain::order::{OrderError, OrderPaymentStatus, OrderStatus};
use crate::domain::payment::PaymentIntentStatus;
use crate::ports::PaymentGateway;

#[derive(Debug, Clone)]
pub struct GetPaymentStatusQuery {
    pub user: AuthenticatedUser,
    pub payment_intent_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStatusView {
    pub payment_intent_id: String,
    pub status: PaymentIntentStatus,
    pub amount: i64,
    pub currency: String,
    pub client_secret: Option<String>,
    pub metadata: HashMap<String, String>,
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
}

pub struct GetPaymentStatusHandler {
    gateway: Arc<dyn PaymentGateway>,
    reconciler: Arc<PaymentReconciler>,
}

impl GetPaymentStatusHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, reconciler: Arc<PaymentReconciler>) -> Self {
        Self {
            gateway,
            reconciler,
        }
    }

    pub async fn handle(&self, query: GetPaymentStatusQuery) -> Result<PaymentStatusView, OrderError> {
        let intent_id = query.payment_intent_id.trim();
        let intent = self
            .gateway
            .get_status(intent_id)
            .await
            .map_err(|e| gateway_error(intent_id, e))?;

        let order_id = intent
            .order_id()
            .ok_or_else(|| OrderError::payment_not_found(intent_id))?;
        let mut order = match self.reconciler.load_owned_order(order_id, &query.user).await {
            Ok(order) => order,
            Err(OrderError::NotFound(_)) => return Err(OrderError::payment_not_found(intent_id)),
            Err(e) => return Err(e),
        };

        // A failed nudge must not fail the read.
        match self
            .reconciler
            .apply_intent_status(
                order.clone(),
                &intent.status,
                SettlementDetails::from_intent(&intent),
                ReconcileSource::Customer,
            )
            .await
        {
            Ok(ReconcileOutcome::Applied) => {
                order = self.reconciler.load_owned_order(order_id, &query.user).await?;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(order_id = %order_id, intent_id, error = %e, "Reconciliation on status read failed");
            }
        }

        Ok(PaymentStatusView {
            payment_intent_id: intent.id,
            status: intent.status,
            amount: intent.amount,
            currency: intent.currency,
            client_secret: intent.client_secret,
            metadata: intent.metadata,
            order_id,
            order_status: order.status,
            payment_status: order.payment_status,
        })
    }
}
