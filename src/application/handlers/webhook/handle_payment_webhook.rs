//! HandlePaymentWebhookHandler - Command handler for provider webhooks.
//!
//! Processes payment events to keep orders and the ledger in step with the
//! provider:
//! - `payment_intent.succeeded` → order confirmed, transaction completed
//! - `payment_intent.payment_failed` → payment failed (never a downgrade)
//! - `charge.refunded` → payment refunded, order cancelled where allowed
//! - `payment_intent.amount_capturable_updated` → status lookup
//!
//! # Idempotency
//!
//! Event ids are recorded once processing succeeds or the event is
//! deliberately ignored. A redelivered event is acknowledged without being
//! applied again. Failed processing is not recorded, so the provider's retry
//! runs it in full.

use std::sync::Arc;

use crate::application::{PaymentReconciler, ReconcileOutcome};
use crate::domain::foundation::OrderId;
use crate::domain::order::OrderError;
use crate::domain::webhook::{
    order_id_from, ChargePayload, PaymentEvent, StripeEvent, StripeWebhookVerifier, WebhookError,
};
use crate::ports::{
    PaymentErrorCode, PaymentGateway, SaveResult, WebhookEventRecord, WebhookEventRepository,
};

/// Command to process an incoming webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw request body, exactly as signed.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value.
    pub signature: String,
}

/// What happened to an accepted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookDisposition {
    Processed,
    /// Already handled by an earlier delivery.
    Duplicate,
    /// Acknowledged without effect.
    Ignored(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlePaymentWebhookResult {
    pub event_id: String,
    pub event_type: String,
    pub disposition: WebhookDisposition,
}

impl HandlePaymentWebhookResult {
    pub fn message(&self) -> String {
        match &self.disposition {
            WebhookDisposition::Processed => format!("Processed {}", self.event_type),
            WebhookDisposition::Duplicate => "Event already processed".to_string(),
            WebhookDisposition::Ignored(reason) => format!("Ignored: {}", reason),
        }
    }
}

/// Handler for provider webhook events.
pub struct HandlePaymentWebhookHandler {
    /// `None` when no signing secret is configured; every request is refused.
    verifier: Option<Arc<StripeWebhookVerifier>>,
    events: Arc<dyn WebhookEventRepository>,
    reconciler: Arc<PaymentReconciler>,
    gateway: Arc<dyn PaymentGateway>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        verifier: Option<Arc<StripeWebhookVerifier>>,
        events: Arc<dyn WebhookEventRepository>,
        reconciler: Arc<PaymentReconciler>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            verifier,
            events,
            reconciler,
            gateway,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<HandlePaymentWebhookResult, WebhookError> {
        // 1. Verify before anything else
        let verifier = self.verifier.as_ref().ok_or(WebhookError::NotConfigured)?;
        if cmd.signature.trim().is_empty() {
            return Err(WebhookError::MissingSignature);
        }
        let event = verifier.verify_and_parse(&cmd.payload, &cmd.signature)?;

        // 2. Redelivery short-circuit
        if self
            .events
            .find_by_event_id(&event.id)
            .await
            .map_err(|e| WebhookError::Database(e.to_string()))?
            .is_some()
        {
            tracing::info!(event_id = %event.id, event_type = %event.event_type, "Duplicate webhook event");
            return Ok(HandlePaymentWebhookResult {
                event_id: event.id,
                event_type: event.event_type,
                disposition: WebhookDisposition::Duplicate,
            });
        }

        // 3. Apply
        let parsed = PaymentEvent::from_envelope(&event)?;
        tracing::info!(event_id = %event.id, event_type = %parsed.kind(), "Processing webhook event");

        let outcome = match &parsed {
            PaymentEvent::PaymentSucceeded(intent) => {
                self.reconciler.on_payment_succeeded(intent).await
            }
            PaymentEvent::PaymentFailed(intent) => self.reconciler.on_payment_failed(intent).await,
            PaymentEvent::ChargeRefunded(charge) => {
                let order_id = self.resolve_charge_order(charge).await?;
                self.reconciler.on_charge_refunded(charge, order_id).await
            }
            PaymentEvent::AmountCapturableUpdated(intent) => {
                self.reconciler.on_amount_capturable_updated(intent).await
            }
            PaymentEvent::Unsupported(kind) => {
                tracing::debug!(event_id = %event.id, event_type = %kind, "Unhandled event type");
                Ok(ReconcileOutcome::Skipped("unsupported event type".to_string()))
            }
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) if e.is_retryable() => {
                tracing::error!(event_id = %event.id, error = %e, "Webhook processing failed, provider will retry");
                return Err(retryable_error(e));
            }
            Err(e) => {
                tracing::warn!(event_id = %event.id, error = %e, "Webhook event could not be applied");
                ReconcileOutcome::Skipped(e.message())
            }
        };

        // 4. Record
        let (record, disposition) = match outcome {
            ReconcileOutcome::Applied | ReconcileOutcome::AlreadyApplied => (
                WebhookEventRecord::success(&event.id, &event.event_type, audit_payload(&event)),
                WebhookDisposition::Processed,
            ),
            ReconcileOutcome::Skipped(reason) | ReconcileOutcome::Unresolved(reason) => (
                WebhookEventRecord::ignored(
                    &event.id,
                    &event.event_type,
                    reason.clone(),
                    audit_payload(&event),
                ),
                WebhookDisposition::Ignored(reason),
            ),
        };
        match self
            .events
            .save(record)
            .await
            .map_err(|e| WebhookError::Database(e.to_string()))?
        {
            SaveResult::Inserted => {}
            SaveResult::AlreadyExists => {
                tracing::debug!(event_id = %event.id, "Event recorded by a concurrent delivery");
            }
        }

        Ok(HandlePaymentWebhookResult {
            event_id: event.id,
            event_type: event.event_type,
            disposition,
        })
    }

    /// Finds the order behind a refunded charge: charge metadata first, then
    /// the ledger row for its intent, then the intent's own metadata.
    async fn resolve_charge_order(
        &self,
        charge: &ChargePayload,
    ) -> Result<Option<OrderId>, WebhookError> {
        if let Some(order_id) = order_id_from(&charge.metadata) {
            return Ok(Some(order_id));
        }
        let Some(intent_id) = charge.payment_intent.as_deref() else {
            return Ok(None);
        };

        if let Some(order_id) = self
            .reconciler
            .order_for_intent(intent_id)
            .await
            .map_err(retryable_error)?
        {
            return Ok(Some(order_id));
        }

        match self.gateway.get_status(intent_id).await {
            Ok(intent) => Ok(intent.order_id()),
            Err(e) if e.code == PaymentErrorCode::NotFound => Ok(None),
            Err(e) if e.code == PaymentErrorCode::GatewayUnavailable => {
                tracing::warn!(charge_id = %charge.id, intent_id, "Cannot look up intent, gateway not configured");
                Ok(None)
            }
            Err(e) => Err(WebhookError::Provider(e.to_string())),
        }
    }
}

fn retryable_error(err: OrderError) -> WebhookError {
    match err {
        OrderError::Conflict(detail) => WebhookError::Conflict(detail),
        OrderError::PaymentUnavailable => WebhookError::Provider(err.message()),
        other => WebhookError::Database(other.to_string()),
    }
}

fn audit_payload(event: &StripeEvent) -> serde_json::Value {
    event.data.object.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryOrderRepository, InMemoryTransactionLedger, InMemoryWebhookEventRepository,
        RecordingNotificationDispatcher,
    };
    use crate::adapters::stripe::MockPaymentGateway;
    use crate::domain::foundation::DomainError;
    use crate::domain::order::test_support::pending_order;
    use crate::domain::order::{OrderPaymentStatus, OrderStatus};
    use crate::domain::webhook::sign_payload;
    use secrecy::SecretString;
    use serde_json::json;

    const SECRET: &str = "whsec_test_secret";

    // ════════════════════════════════════════════════════════════════════════════
    // Fixture
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        orders: Arc<InMemoryOrderRepository>,
        ledger: Arc<InMemoryTransactionLedger>,
        events: Arc<InMemoryWebhookEventRepository>,
        handler: HandlePaymentWebhookHandler,
    }

    async fn fixture() -> Fixture {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let events = Arc::new(InMemoryWebhookEventRepository::new());
        orders.seed(pending_order(1001, "alice", 1999)).await;
        let reconciler = Arc::new(PaymentReconciler::new(
            orders.clone(),
            ledger.clone(),
            Arc::new(RecordingNotificationDispatcher::new()),
        ));
        let verifier = StripeWebhookVerifier::new(SecretString::new(SECRET.to_string()));
        Fixture {
            handler: HandlePaymentWebhookHandler::new(
                Some(Arc::new(verifier)),
                events.clone(),
                reconciler,
                Arc::new(MockPaymentGateway::new()),
            ),
            orders,
            ledger,
            events,
        }
    }

    fn signed(event: serde_json::Value) -> HandlePaymentWebhookCommand {
        let payload = event.to_string();
        HandlePaymentWebhookCommand {
            signature: sign_payload(SECRET, chrono::Utc::now().timestamp(), &payload),
            payload: payload.into_bytes(),
        }
    }

    fn event(id: &str, kind: &str, object: serde_json::Value) -> serde_json::Value {
        json!({
            "id": id,
            "type": kind,
            "created": 1_700_000_000,
            "livemode": false,
            "data": { "object": object }
        })
    }

    fn intent_object(order_id: Option<&str>, status: &str) -> serde_json::Value {
        let metadata = match order_id {
            Some(id) => json!({ "order_id": id }),
            None => json!({}),
        };
        json!({
            "id": "pi_1",
            "object": "payment_intent",
            "status": status,
            "amount": 1999,
            "currency": "usd",
            "metadata": metadata,
            "latest_charge": "ch_1",
            "payment_method_types": ["card"]
        })
    }

    async fn order_status(f: &Fixture) -> (OrderStatus, OrderPaymentStatus) {
        let order = f.orders.get(OrderId::new(1001).unwrap()).await.unwrap();
        (order.status, order.payment_status)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn succeeded_event_confirms_order() {
        let f = fixture().await;

        let result = f
            .handler
            .handle(signed(event("evt_1", "payment_intent.succeeded", intent_object(Some("1001"), "succeeded"))))
            .await
            .unwrap();

        assert_eq!(result.disposition, WebhookDisposition::Processed);
        assert_eq!(order_status(&f).await, (OrderStatus::Confirmed, OrderPaymentStatus::Completed));
        assert_eq!(f.ledger.count().await, 1);
        assert_eq!(f.events.count().await, 1);
    }

    #[tokio::test]
    async fn redelivery_is_acknowledged_without_reapplying() {
        let f = fixture().await;
        let body = event("evt_1", "payment_intent.succeeded", intent_object(Some("1001"), "succeeded"));

        f.handler.handle(signed(body.clone())).await.unwrap();
        let second = f.handler.handle(signed(body)).await.unwrap();

        assert_eq!(second.disposition, WebhookDisposition::Duplicate);
        assert_eq!(f.ledger.count().await, 1);
        let order = f.orders.get(OrderId::new(1001).unwrap()).await.unwrap();
        assert_eq!(order.version, 2);
    }

    #[tokio::test]
    async fn bad_signature_touches_nothing() {
        let f = fixture().await;
        let mut cmd = signed(event("evt_1", "payment_intent.succeeded", intent_object(Some("1001"), "succeeded")));
        cmd.signature = format!("t={},v1={}", chrono::Utc::now().timestamp(), "00".repeat(32));

        let err = f.handler.handle(cmd).await.unwrap_err();

        assert_eq!(err, WebhookError::InvalidSignature);
        assert_eq!(order_status(&f).await, (OrderStatus::Pending, OrderPaymentStatus::Pending));
        assert_eq!(f.events.count().await, 0);
    }

    #[tokio::test]
    async fn missing_signature_and_missing_secret_are_refused() {
        let f = fixture().await;
        let mut cmd = signed(event("evt_1", "payment_intent.succeeded", intent_object(Some("1001"), "succeeded")));
        cmd.signature = String::new();
        assert_eq!(f.handler.handle(cmd.clone()).await.unwrap_err(), WebhookError::MissingSignature);

        let unconfigured = HandlePaymentWebhookHandler::new(
            None,
            f.events.clone(),
            Arc::new(PaymentReconciler::new(
                f.orders.clone(),
                f.ledger.clone(),
                Arc::new(RecordingNotificationDispatcher::new()),
            )),
            Arc::new(MockPaymentGateway::new()),
        );
        assert_eq!(unconfigured.handle(cmd).await.unwrap_err(), WebhookError::NotConfigured);
    }

    #[tokio::test]
    async fn unknown_event_type_is_ignored_and_recorded() {
        let f = fixture().await;

        let result = f
            .handler
            .handle(signed(event("evt_9", "customer.created", json!({ "id": "cus_1" }))))
            .await
            .unwrap();

        assert!(matches!(result.disposition, WebhookDisposition::Ignored(_)));
        assert_eq!(f.events.count().await, 1);
    }

    #[tokio::test]
    async fn event_without_order_metadata_is_ignored() {
        let f = fixture().await;

        let result = f
            .handler
            .handle(signed(event("evt_2", "payment_intent.succeeded", intent_object(None, "succeeded"))))
            .await
            .unwrap();

        assert!(matches!(result.disposition, WebhookDisposition::Ignored(_)));
        assert_eq!(order_status(&f).await, (OrderStatus::Pending, OrderPaymentStatus::Pending));
    }

    #[tokio::test]
    async fn retryable_failure_is_not_recorded() {
        let f = fixture().await;
        f.orders.fail_next_update(DomainError::conflict("stale")).await;
        let body = event("evt_3", "payment_intent.succeeded", intent_object(Some("1001"), "succeeded"));

        let err = f.handler.handle(signed(body.clone())).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(f.events.count().await, 0);

        // The provider's retry completes the order.
        let retry = f.handler.handle(signed(body)).await.unwrap();
        assert_eq!(retry.disposition, WebhookDisposition::Processed);
        assert_eq!(order_status(&f).await, (OrderStatus::Confirmed, OrderPaymentStatus::Completed));
        assert_eq!(f.ledger.count().await, 1);
    }

    #[tokio::test]
    async fn refund_resolves_order_through_the_ledger() {
        let f = fixture().await;
        f.handler
            .handle(signed(event("evt_1", "payment_intent.succeeded", intent_object(Some("1001"), "succeeded"))))
            .await
            .unwrap();

        let charge = json!({
            "id": "ch_1",
            "object": "charge",
            "payment_intent": "pi_1",
            "amount": 1999,
            "amount_refunded": 1999,
            "refunded": true,
            "metadata": {}
        });
        let result = f
            .handler
            .handle(signed(event("evt_4", "charge.refunded", charge)))
            .await
            .unwrap();

        assert_eq!(result.disposition, WebhookDisposition::Processed);
        assert_eq!(order_status(&f).await, (OrderStatus::Cancelled, OrderPaymentStatus::Refunded));
    }

    #[tokio::test]
    async fn late_failure_does_not_downgrade() {
        let f = fixture().await;
        f.handler
            .handle(signed(event("evt_1", "payment_intent.succeeded", intent_object(Some("1001"), "succeeded"))))
            .await
            .unwrap();

        f.handler
            .handle(signed(event(
                "evt_2",
                "payment_intent.payment_failed",
                intent_object(Some("1001"), "requires_payment_method"),
            )))
            .await
            .unwrap();

        assert_eq!(order_status(&f).await, (OrderStatus::Confirmed, OrderPaymentStatus::Completed));
    }
}
