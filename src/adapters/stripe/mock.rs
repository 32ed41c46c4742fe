//! Mock payment gateway for testing.
//!
//! Keeps intents in memory and supports:
//! - Pre-seeded intents in any provider state
//! - Declined confirmations and rejected refunds
//! - Error injection, per call or per method
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::foundation::Money;
use crate::domain::payment::PaymentIntentStatus;
use crate::domain::webhook::ORDER_ID_METADATA_KEY;
use crate::ports::{
    ConfirmOutcome, CreateIntentRequest, PaymentError, PaymentGateway, PaymentIntent,
    RefundOutcome,
};

/// Mock payment gateway.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentGateway::new();
/// mock.decline_next_confirm("Your card was declined.");
/// let outcome = mock.confirm("pi_mock_1", Some("pm_card_visa")).await?;
/// assert!(!outcome.succeeded);
/// ```
#[derive(Clone)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

struct MockState {
    intents: HashMap<String, PaymentIntent>,
    next_decline: Option<String>,
    refund_rejection: Option<String>,
    /// Consumed by the next call to any method.
    next_error: Option<PaymentError>,
    method_errors: HashMap<String, PaymentError>,
    available: bool,
    sequence: u64,
    call_log: Vec<MethodCall>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            intents: HashMap::new(),
            next_decline: None,
            refund_rejection: None,
            next_error: None,
            method_errors: HashMap::new(),
            available: true,
            sequence: 0,
            call_log: Vec::new(),
        }
    }
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// A gateway with no credentials: every call fails as unavailable.
    pub fn unavailable() -> Self {
        let mock = Self::new();
        mock.set_available(false);
        mock
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration
    // ════════════════════════════════════════════════════════════════════════════

    /// Stores an intent as the provider would report it.
    pub fn put_intent(&self, intent: PaymentIntent) {
        self.state().intents.insert(intent.id.clone(), intent);
    }

    /// Moves a stored intent to `status`, optionally attaching a charge.
    pub fn set_intent_status(
        &self,
        intent_id: &str,
        status: PaymentIntentStatus,
        latest_charge: Option<&str>,
    ) {
        if let Some(intent) = self.state().intents.get_mut(intent_id) {
            intent.status = status;
            if let Some(charge) = latest_charge {
                intent.latest_charge = Some(charge.to_string());
            }
        }
    }

    pub fn intent(&self, intent_id: &str) -> Option<PaymentIntent> {
        self.state().intents.get(intent_id).cloned()
    }

    /// The next confirmation is declined with `message`.
    pub fn decline_next_confirm(&self, message: &str) {
        self.state().next_decline = Some(message.to_string());
    }

    /// Every refund is refused with `message` until cleared.
    pub fn reject_refunds(&self, message: &str) {
        self.state().refund_rejection = Some(message.to_string());
    }

    pub fn set_available(&self, available: bool) {
        self.state().available = available;
    }

    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state()
            .method_errors
            .insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
        state.refund_rejection = None;
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.state();

        if !state.available {
            return Err(PaymentError::unavailable("payment gateway is not configured"));
        }
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        Ok(())
    }

    fn next_id(state: &mut MockState, prefix: &str) -> String {
        state.sequence += 1;
        format!("{}_mock_{}", prefix, state.sequence)
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        self.record_call(
            "create_intent",
            vec![
                request.order_id.to_string(),
                request.amount.minor_units().to_string(),
            ],
        );
        if request.amount.minor_units() <= 0 {
            return Err(PaymentError::invalid_request("amount must be positive"));
        }
        self.check_error("create_intent")?;

        let mut state = self.state();
        let id = Self::next_id(&mut state, "pi");
        let mut metadata = request.metadata;
        metadata.insert(
            ORDER_ID_METADATA_KEY.to_string(),
            request.order_id.to_string(),
        );

        let intent = PaymentIntent {
            client_secret: Some(format!("{}_secret_test", id)),
            id: id.clone(),
            status: PaymentIntentStatus::RequiresPaymentMethod,
            amount: request.amount.minor_units(),
            currency: request.currency.as_str().to_string(),
            metadata,
            latest_charge: None,
            payment_method_types: vec!["card".to_string()],
            last_error: None,
        };
        state.intents.insert(id, intent.clone());
        Ok(intent)
    }

    async fn confirm(
        &self,
        intent_id: &str,
        payment_method_id: Option<&str>,
    ) -> Result<ConfirmOutcome, PaymentError> {
        self.record_call(
            "confirm",
            vec![
                intent_id.to_string(),
                payment_method_id.unwrap_or_default().to_string(),
            ],
        );
        self.check_error("confirm")?;

        let mut state = self.state();
        let decline = state.next_decline.take();
        let charge_id = Self::next_id(&mut state, "ch");
        let intent = state
            .intents
            .get_mut(intent_id)
            .ok_or_else(|| PaymentError::not_found("PaymentIntent"))?;

        if intent.status.is_succeeded() {
            return Ok(ConfirmOutcome {
                succeeded: true,
                intent: intent.clone(),
                decline_message: None,
            });
        }

        if let Some(message) = decline {
            intent.status = PaymentIntentStatus::RequiresPaymentMethod;
            intent.last_error = Some(message.clone());
            return Ok(ConfirmOutcome {
                succeeded: false,
                intent: intent.clone(),
                decline_message: Some(message),
            });
        }

        intent.status = PaymentIntentStatus::Succeeded;
        intent.latest_charge = Some(charge_id);
        intent.last_error = None;
        Ok(ConfirmOutcome {
            succeeded: true,
            intent: intent.clone(),
            decline_message: None,
        })
    }

    async fn refund(
        &self,
        intent_id: &str,
        amount: Option<Money>,
    ) -> Result<RefundOutcome, PaymentError> {
        self.record_call(
            "refund",
            vec![
                intent_id.to_string(),
                amount.map(|a| a.minor_units().to_string()).unwrap_or_default(),
            ],
        );
        self.check_error("refund")?;

        let mut state = self.state();
        if let Some(message) = state.refund_rejection.clone() {
            return Ok(RefundOutcome::rejected(message));
        }
        let refund_id = Self::next_id(&mut state, "re");
        let intent = state
            .intents
            .get(intent_id)
            .ok_or_else(|| PaymentError::not_found("PaymentIntent"))?;

        if !intent.status.is_succeeded() {
            return Ok(RefundOutcome::rejected(format!(
                "PaymentIntent {} has not succeeded",
                intent_id
            )));
        }

        let refunded = amount.map(|a| a.minor_units()).unwrap_or(intent.amount);
        if refunded > intent.amount {
            return Ok(RefundOutcome::rejected(
                "Refund amount exceeds the captured amount",
            ));
        }

        Ok(RefundOutcome {
            success: true,
            refund_id: Some(refund_id),
            amount: Some(refunded),
            message: "Refund processed".to_string(),
        })
    }

    async fn get_status(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        self.record_call("get_status", vec![intent_id.to_string()]);
        self.check_error("get_status")?;

        self.state()
            .intents
            .get(intent_id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("PaymentIntent"))
    }

    async fn is_available(&self) -> bool {
        self.record_call("is_available", vec![]);
        self.state().available
    }
}
