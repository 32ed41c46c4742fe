//! PaymentReconciler - converges orders and the transaction ledger onto what
//! the payment provider reports.
//!
//! Both the synchronous payment handlers and webhook ingestion funnel into
//! the `apply_*` methods here. Every method re-reads both stores and only
//! writes the half that is still missing, so applying the same fact twice is
//! a no-op and applying it after a partial failure repairs the gap.
//!
//! # Write order
//!
//! Order and ledger live in separate stores without a shared transaction.
//! The ledger is always written first, then the order. A crash in between
//! leaves a completed ledger row beside a pending order, which the next
//! delivery of the same event (or the next confirm call) completes.
//!
//! # Concurrency
//!
//! Order writes go through the repository's optimistic `version` check. A
//! stale write surfaces as [`OrderError::Conflict`], which webhook ingestion
//! turns into a retryable failure.

use std::sync::Arc;

use crate::domain::foundation::{
    AuthenticatedUser, Currency, ErrorCode, Money, OrderId, OwnedByUser,
};
use crate::domain::order::{Order, OrderError, OrderPaymentStatus, OrderStatus};
use crate::domain::payment::{NewTransaction, PaymentIntentStatus, Transaction, TransactionStatus};
use crate::domain::webhook::{ChargePayload, IntentPayload};
use crate::ports::{
    NotificationDispatcher, OrderNotification, OrderNotificationKind, OrderRepository,
    PaymentIntent, TransactionLedger,
};

/// Which entry point triggered a reconciliation, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileSource {
    /// A customer call (confirm, refund, status poll).
    Customer,
    /// A verified provider event.
    Webhook,
}

impl ReconcileSource {
    fn as_str(&self) -> &'static str {
        match self {
            ReconcileSource::Customer => "customer",
            ReconcileSource::Webhook => "webhook",
        }
    }
}

/// What a reconciliation step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// At least one store was written.
    Applied,
    /// Both stores already reflected the fact.
    AlreadyApplied,
    /// The fact conflicts with a more advanced local state and was dropped.
    Skipped(String),
    /// No local order could be correlated with the event.
    Unresolved(String),
}

impl ReconcileOutcome {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, ReconcileOutcome::Unresolved(_))
    }

    fn from_changes(changed: bool) -> Self {
        if changed {
            ReconcileOutcome::Applied
        } else {
            ReconcileOutcome::AlreadyApplied
        }
    }
}

/// Provider facts about a settled payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementDetails {
    pub intent_id: String,
    /// Charge id when known, else the intent id.
    pub provider_transaction_id: String,
    pub payment_method: Option<String>,
    pub amount: Option<Money>,
    pub currency: Option<Currency>,
}

impl SettlementDetails {
    pub fn from_intent(intent: &PaymentIntent) -> Self {
        Self {
            intent_id: intent.id.clone(),
            provider_transaction_id: intent.provider_transaction_id(),
            payment_method: intent.payment_method_label(),
            amount: Money::positive("amount", intent.amount).ok(),
            currency: intent.currency.parse().ok(),
        }
    }

    pub fn from_payload(intent: &IntentPayload) -> Self {
        Self {
            intent_id: intent.id.clone(),
            provider_transaction_id: intent
                .latest_charge
                .clone()
                .unwrap_or_else(|| intent.id.clone()),
            payment_method: intent.payment_method_types.first().cloned(),
            amount: Money::positive("amount", intent.amount).ok(),
            currency: intent.currency.as_deref().and_then(|c| c.parse().ok()),
        }
    }
}

pub struct PaymentReconciler {
    orders: Arc<dyn OrderRepository>,
    ledger: Arc<dyn TransactionLedger>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl PaymentReconciler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        ledger: Arc<dyn TransactionLedger>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            orders,
            ledger,
            notifier,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Lookups
    // ════════════════════════════════════════════════════════════════════════════

    /// Loads an order for a customer-initiated operation.
    ///
    /// An order owned by someone else is reported exactly like a missing one.
    pub async fn load_owned_order(
        &self,
        order_id: OrderId,
        requester: &AuthenticatedUser,
    ) -> Result<Order, OrderError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| OrderError::not_found(order_id))?;

        if let Err(e) = order.check_ownership(&requester.id) {
            tracing::warn!(
                order_id = %order_id,
                requested_by = %requester.id,
                error = %e,
                "Order access denied"
            );
            return Err(OrderError::not_found(order_id));
        }
        Ok(order)
    }

    /// Current ledger row for an order (most recent attempt).
    pub async fn current_transaction(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Transaction>, OrderError> {
        Ok(self.ledger.find_by_order(order_id).await?)
    }

    /// Order recorded against a provider intent in the ledger.
    pub async fn order_for_intent(&self, intent_id: &str) -> Result<Option<OrderId>, OrderError> {
        Ok(self
            .ledger
            .find_by_payment_intent(intent_id)
            .await?
            .map(|tx| tx.order_id))
    }

    /// Ledger row for a provider intent, provided it belongs to `order`.
    pub async fn transaction_for_intent(
        &self,
        order: &Order,
        intent_id: &str,
    ) -> Result<Option<Transaction>, OrderError> {
        let found = self.ledger.find_by_payment_intent(intent_id).await?;
        Ok(found.filter(|tx| tx.order_id == order.id))
    }

    async fn resolve(
        &self,
        order_id: Option<OrderId>,
        object_id: &str,
    ) -> Result<Result<Order, ReconcileOutcome>, OrderError> {
        let Some(order_id) = order_id else {
            tracing::warn!(object_id, "Provider object carries no order_id metadata");
            return Ok(Err(ReconcileOutcome::Unresolved(
                "missing order_id metadata".to_string(),
            )));
        };
        match self.orders.find_by_id(order_id).await? {
            Some(order) => Ok(Ok(order)),
            None => {
                tracing::warn!(order_id = %order_id, object_id, "Provider object references unknown order");
                Ok(Err(ReconcileOutcome::Unresolved(format!(
                    "order {} not found",
                    order_id
                ))))
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Transitions
    // ════════════════════════════════════════════════════════════════════════════

    /// Records a settled payment on both the ledger and the order.
    pub async fn apply_payment_success(
        &self,
        mut order: Order,
        details: SettlementDetails,
        source: ReconcileSource,
    ) -> Result<ReconcileOutcome, OrderError> {
        if order.status == OrderStatus::Cancelled
            || order.payment_status == OrderPaymentStatus::Refunded
        {
            tracing::warn!(
                order_id = %order.id,
                intent_id = %details.intent_id,
                status = %order.status,
                payment_status = %order.payment_status,
                source = source.as_str(),
                "Settlement for a cancelled or refunded order left untouched"
            );
            return Ok(ReconcileOutcome::Skipped(format!(
                "order is {} with payment {}",
                order.status, order.payment_status
            )));
        }

        let ledger_changed = self.settle_ledger(&order, &details).await?;

        let from = order.status;
        let order_changed = order.mark_paid(details.payment_method.as_deref())?;
        if order_changed {
            order = self.orders.update(&order).await?;
            tracing::info!(
                order_id = %order.id,
                intent_id = %details.intent_id,
                from = %from,
                to = %order.status,
                source = source.as_str(),
                "Order payment confirmed"
            );
            self.notify(&order, OrderNotificationKind::Confirmed).await;
        }

        Ok(ReconcileOutcome::from_changes(ledger_changed || order_changed))
    }

    async fn settle_ledger(
        &self,
        order: &Order,
        details: &SettlementDetails,
    ) -> Result<bool, OrderError> {
        let existing = self.transaction_for_intent(order, &details.intent_id).await?;

        match existing {
            Some(tx) if matches!(tx.status, TransactionStatus::Completed | TransactionStatus::Refunded) => {
                Ok(false)
            }
            Some(tx) if tx.status != TransactionStatus::Cancelled => {
                self.ledger
                    .update_with_provider_id(
                        tx.id,
                        TransactionStatus::Completed,
                        &details.provider_transaction_id,
                        details.payment_method.clone(),
                    )
                    .await?;
                tracing::debug!(
                    transaction_id = %tx.id,
                    from = %tx.status,
                    to = %TransactionStatus::Completed,
                    "Transaction settled"
                );
                Ok(true)
            }
            _ => {
                let new = NewTransaction {
                    order_id: order.id,
                    user_id: order.user_id.clone(),
                    amount: details.amount.unwrap_or(order.total_amount),
                    currency: details
                        .currency
                        .clone()
                        .unwrap_or_else(|| order.currency.clone()),
                    status: TransactionStatus::Completed,
                    payment_method: details.payment_method.clone(),
                    provider_transaction_id: Some(details.provider_transaction_id.clone()),
                    payment_intent_id: Some(details.intent_id.clone()),
                    error_message: None,
                };
                match self.ledger.insert(new).await {
                    Ok(tx) => {
                        tracing::debug!(transaction_id = %tx.id, order_id = %order.id, "Transaction recorded");
                        Ok(true)
                    }
                    // Another delivery recorded the same settlement first.
                    Err(e) if e.code == ErrorCode::DuplicateProviderTransaction => Ok(false),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    /// Records a failed attempt. Never downgrades a settled payment.
    pub async fn apply_payment_failure(
        &self,
        mut order: Order,
        intent_id: &str,
        error_message: Option<String>,
        source: ReconcileSource,
    ) -> Result<ReconcileOutcome, OrderError> {
        let message = error_message.unwrap_or_else(|| "Payment failed".to_string());

        let ledger_changed = match self.transaction_for_intent(&order, intent_id).await? {
            Some(tx) => match tx.status {
                TransactionStatus::Pending | TransactionStatus::Processing => {
                    self.ledger
                        .update_status(tx.id, TransactionStatus::Failed, Some(message.clone()))
                        .await?;
                    true
                }
                _ => false,
            },
            None if order.payment_status.accepts_payment() => {
                self.ledger
                    .insert(NewTransaction {
                        order_id: order.id,
                        user_id: order.user_id.clone(),
                        amount: order.total_amount,
                        currency: order.currency.clone(),
                        status: TransactionStatus::Failed,
                        payment_method: None,
                        provider_transaction_id: None,
                        payment_intent_id: Some(intent_id.to_string()),
                        error_message: Some(message.clone()),
                    })
                    .await?;
                true
            }
            None => false,
        };

        let order_changed = order.mark_payment_failed();
        if order_changed {
            order = self.orders.update(&order).await?;
            tracing::info!(
                order_id = %order.id,
                intent_id,
                payment_status = %order.payment_status,
                source = source.as_str(),
                "Order payment failed"
            );
        }

        Ok(ReconcileOutcome::from_changes(ledger_changed || order_changed))
    }

    /// Records a refund: payment `refunded`, order `cancelled` where allowed.
    pub async fn apply_refund(
        &self,
        mut order: Order,
        intent_id: &str,
        refund_id: Option<&str>,
        source: ReconcileSource,
    ) -> Result<ReconcileOutcome, OrderError> {
        if !matches!(
            order.payment_status,
            OrderPaymentStatus::Completed | OrderPaymentStatus::Refunded
        ) {
            tracing::warn!(
                order_id = %order.id,
                intent_id,
                payment_status = %order.payment_status,
                source = source.as_str(),
                "Refund for an order that was never marked paid"
            );
            return Ok(ReconcileOutcome::Skipped(format!(
                "payment is {}",
                order.payment_status
            )));
        }

        let tx = match self.transaction_for_intent(&order, intent_id).await? {
            Some(tx) => Some(tx),
            None => self.ledger.find_by_order(order.id).await?,
        };
        let ledger_changed = match tx {
            Some(tx) if tx.status == TransactionStatus::Completed => {
                self.ledger
                    .update_status(tx.id, TransactionStatus::Refunded, None)
                    .await?;
                true
            }
            Some(_) => false,
            None => {
                tracing::warn!(order_id = %order.id, intent_id, "Refund without a ledger row");
                false
            }
        };

        let from = order.status;
        let effect = order.apply_refund()?;
        if effect.changed() {
            order = self.orders.update(&order).await?;
            if !effect.order_cancelled && from != OrderStatus::Cancelled {
                tracing::warn!(
                    order_id = %order.id,
                    status = %order.status,
                    "Refunded order is past the point of cancellation, status kept"
                );
            }
            tracing::info!(
                order_id = %order.id,
                intent_id,
                refund_id = refund_id.unwrap_or("-"),
                from = %from,
                to = %order.status,
                source = source.as_str(),
                "Order refunded"
            );
            self.notify(
                &order,
                OrderNotificationKind::Refunded {
                    order_cancelled: effect.order_cancelled,
                },
            )
            .await;
        }

        Ok(ReconcileOutcome::from_changes(ledger_changed || effect.changed()))
    }

    /// Nudges the order towards the intent's provider status.
    ///
    /// Only `succeeded` moves anything; `pending` is never re-entered.
    pub async fn apply_intent_status(
        &self,
        order: Order,
        status: &PaymentIntentStatus,
        details: SettlementDetails,
        source: ReconcileSource,
    ) -> Result<ReconcileOutcome, OrderError> {
        match status.implied_order_status() {
            Some(OrderStatus::Confirmed) => {
                self.apply_payment_success(order, details, source).await
            }
            Some(_) => Ok(ReconcileOutcome::AlreadyApplied),
            None => Ok(ReconcileOutcome::Skipped(format!(
                "intent status {} has no order mapping",
                status
            ))),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook entry points
    // ════════════════════════════════════════════════════════════════════════════

    pub async fn on_payment_succeeded(
        &self,
        intent: &IntentPayload,
    ) -> Result<ReconcileOutcome, OrderError> {
        match self.resolve(intent.order_id(), &intent.id).await? {
            Ok(order) => {
                self.apply_payment_success(
                    order,
                    SettlementDetails::from_payload(intent),
                    ReconcileSource::Webhook,
                )
                .await
            }
            Err(unresolved) => Ok(unresolved),
        }
    }

    pub async fn on_payment_failed(
        &self,
        intent: &IntentPayload,
    ) -> Result<ReconcileOutcome, OrderError> {
        match self.resolve(intent.order_id(), &intent.id).await? {
            Ok(order) => {
                self.apply_payment_failure(
                    order,
                    &intent.id,
                    intent.failure_message(),
                    ReconcileSource::Webhook,
                )
                .await
            }
            Err(unresolved) => Ok(unresolved),
        }
    }

    /// `order_id` is resolved by the caller from the charge or its intent.
    pub async fn on_charge_refunded(
        &self,
        charge: &ChargePayload,
        order_id: Option<OrderId>,
    ) -> Result<ReconcileOutcome, OrderError> {
        let Some(intent_id) = charge.payment_intent.as_deref() else {
            tracing::warn!(charge_id = %charge.id, "Refunded charge has no payment intent");
            return Ok(ReconcileOutcome::Unresolved(
                "charge has no payment intent".to_string(),
            ));
        };
        match self.resolve(order_id, &charge.id).await? {
            Ok(order) => {
                if !charge.refunded {
                    tracing::info!(
                        order_id = %order.id,
                        charge_id = %charge.id,
                        amount = charge.amount,
                        amount_refunded = charge.amount_refunded,
                        "Partial refund treated as a refund of the order"
                    );
                }
                self.apply_refund(order, intent_id, None, ReconcileSource::Webhook)
                    .await
            }
            Err(unresolved) => Ok(unresolved),
        }
    }

    pub async fn on_amount_capturable_updated(
        &self,
        intent: &IntentPayload,
    ) -> Result<ReconcileOutcome, OrderError> {
        match self.resolve(intent.order_id(), &intent.id).await? {
            Ok(order) => {
                self.apply_intent_status(
                    order,
                    &intent.status,
                    SettlementDetails::from_payload(intent),
                    ReconcileSource::Webhook,
                )
                .await
            }
            Err(unresolved) => Ok(unresolved),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Notifications
    // ════════════════════════════════════════════════════════════════════════════

    /// Best-effort; a failed send is logged and otherwise ignored.
    pub async fn notify(&self, order: &Order, kind: OrderNotificationKind) {
        let notification = OrderNotification {
            order_id: order.id,
            order_number: order.order_number.clone(),
            recipient: order.contact_email.clone(),
            total_amount: order.total_amount,
            kind,
        };
        if let Err(e) = self.notifier.dispatch(notification).await {
            tracing::error!(order_id = %order.id, error = %e, "Failed to send order notification");
        }
    }
}
