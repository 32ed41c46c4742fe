//! CreatePaymentIntentHandler - Starts a payment attempt for an order.

use std::collections::HashMap;
use std::sync::Arc;

use super::gateway_error;
use crate::application::PaymentReconciler;
use crate::domain::foundation::{AuthenticatedUser, Money, OrderId};
use crate::domain::order::{OrderError, OrderPaymentStatus};
use crate::domain::payment::{NewTransaction, PaymentIntentStatus, TransactionStatus};
use crate::ports::{CreateIntentRequest, OrderRepository, PaymentGateway, TransactionLedger};

#[derive(Debug, Clone)]
pub struct CreatePaymentIntentCommand {
    pub user: AuthenticatedUser,
    pub order_id: OrderId,
    /// Minor units; must equal the order total.
    pub amount: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePaymentIntentResult {
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
    pub status: PaymentIntentStatus,
}

/// Handler for creating payment intents.
///
/// Records a `pending` ledger row for the new intent so later events for it
/// update that row rather than adding another. A previously failed attempt
/// puts the order's payment status back to `pending`.
pub struct CreatePaymentIntentHandler {
    gateway: Arc<dyn PaymentGateway>,
    orders: Arc<dyn OrderRepository>,
    ledger: Arc<dyn TransactionLedger>,
    reconciler: Arc<PaymentReconciler>,
}

impl CreatePaymentIntentHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        orders: Arc<dyn OrderRepository>,
        ledger: Arc<dyn TransactionLedger>,
        reconciler: Arc<PaymentReconciler>,
    ) -> Self {
        Self {
            gateway,
            orders,
            ledger,
            reconciler,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentIntentCommand,
    ) -> Result<CreatePaymentIntentResult, OrderError> {
        let amount = Money::positive("amount", cmd.amount)?;

        // 1. Ownership before anything reaches the provider
        let mut order = self
            .reconciler
            .load_owned_order(cmd.order_id, &cmd.user)
            .await?;

        if !order.is_payable() {
            return Err(OrderError::invalid_state(
                format!("{} with payment {}", order.status, order.payment_status),
                "start a payment for the order",
            ));
        }
        if amount != order.total_amount {
            return Err(OrderError::validation(
                "amount",
                format!("Amount must equal the order total of {}", order.total_amount),
            ));
        }

        // 2. Create the intent
        let description = cmd
            .description
            .unwrap_or_else(|| format!("Order {}", order.order_number));
        let metadata = HashMap::from([(
            "order_number".to_string(),
            order.order_number.to_string(),
        )]);
        let intent = self
            .gateway
            .create_intent(CreateIntentRequest {
                order_id: order.id,
                amount,
                currency: order.currency.clone(),
                description: Some(description),
                metadata,
            })
            .await
            .map_err(|e| gateway_error("new intent", e))?;

        // 3. Track the attempt
        self.ledger
            .insert(NewTransaction {
                order_id: order.id,
                user_id: order.user_id.clone(),
                amount,
                currency: order.currency.clone(),
                status: TransactionStatus::Pending,
                payment_method: None,
                provider_transaction_id: None,
                payment_intent_id: Some(intent.id.clone()),
                error_message: None,
            })
            .await?;

        let retried = order.payment_status == OrderPaymentStatus::Failed;
        if order.begin_payment_attempt()? {
            order = self.orders.update(&order).await?;
        }

        tracing::info!(
            order_id = %order.id,
            intent_id = %intent.id,
            amount = %amount,
            retried,
            "Payment intent created"
        );

        Ok(CreatePaymentIntentResult {
            client_secret: intent.client_secret,
            payment_intent_id: intent.id,
            status: intent.status,
        })
    }
}
