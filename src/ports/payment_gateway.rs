//! Payment gateway port.
//!
//! Wraps the payment provider's intent API and normalises its replies into
//! local result shapes. A declined card or a refused refund is a normal
//! negative outcome, not a `PaymentError`; errors are reserved for the
//! provider being unreachable, misconfigured, or rejecting the request itself.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Currency, DomainError, ErrorCode, Money, OrderId};
use crate::domain::payment::PaymentIntentStatus;
use crate::domain::webhook::order_id_from;

/// Port for the external payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payment intent for an order.
    ///
    /// The order id is embedded in provider metadata so that asynchronous
    /// events can be correlated back to the order.
    async fn create_intent(&self, request: CreateIntentRequest)
        -> Result<PaymentIntent, PaymentError>;

    /// Confirms an intent.
    ///
    /// Already-succeeded intents report success without being re-submitted.
    async fn confirm(
        &self,
        intent_id: &str,
        payment_method_id: Option<&str>,
    ) -> Result<ConfirmOutcome, PaymentError>;

    /// Issues a full (`amount = None`) or partial refund.
    async fn refund(
        &self,
        intent_id: &str,
        amount: Option<Money>,
    ) -> Result<RefundOutcome, PaymentError>;

    /// Read-only fetch of the intent's current provider state.
    async fn get_status(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError>;

    /// Lightweight authenticated probe. Never errors.
    async fn is_available(&self) -> bool;
}

/// Request to create a payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntentRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: Currency,
    pub description: Option<String>,
    /// Extra metadata; `order_id` is always set by the adapter.
    pub metadata: HashMap<String, String>,
}

/// Provider-side payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: PaymentIntentStatus,
    pub amount: i64,
    pub currency: String,
    pub client_secret: Option<String>,
    pub metadata: HashMap<String, String>,
    /// Most recent charge, used as the settled transaction id.
    pub latest_charge: Option<String>,
    pub payment_method_types: Vec<String>,
    /// Provider's message for the last failed attempt.
    pub last_error: Option<String>,
}

impl PaymentIntent {
    pub fn order_id(&self) -> Option<OrderId> {
        order_id_from(&self.metadata)
    }

    /// Settlement reference: the charge when there is one, else the intent.
    pub fn provider_transaction_id(&self) -> String {
        self.latest_charge.clone().unwrap_or_else(|| self.id.clone())
    }

    /// Short label for the payment method, e.g. `card`.
    pub fn payment_method_label(&self) -> Option<String> {
        self.payment_method_types.first().cloned()
    }
}

/// Result of a confirm call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmOutcome {
    pub succeeded: bool,
    pub intent: PaymentIntent,
    /// Decline reason when the provider refused the payment method.
    pub decline_message: Option<String>,
}

/// Result of a refund call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundOutcome {
    pub success: bool,
    pub refund_id: Option<String>,
    pub amount: Option<i64>,
    pub message: String,
}

impl RefundOutcome {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            refund_id: None,
            amount: None,
            message: message.into(),
        }
    }
}

/// Errors from payment gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentError {
    pub code: PaymentErrorCode,
    pub message: String,
    /// Provider's own error code, if any.
    pub provider_code: Option<String>,
    pub retryable: bool,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::GatewayUnavailable, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidRequest, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        let code = match err.code {
            PaymentErrorCode::GatewayUnavailable
            | PaymentErrorCode::NetworkError
            | PaymentErrorCode::AuthenticationError
            | PaymentErrorCode::RateLimitExceeded => ErrorCode::PaymentUnavailable,
            PaymentErrorCode::InvalidRequest => ErrorCode::ValidationFailed,
            PaymentErrorCode::NotFound => ErrorCode::TransactionNotFound,
            _ => ErrorCode::PaymentProviderError,
        };
        DomainError::new(code, err.message)
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Credentials absent; the gateway is switched off.
    GatewayUnavailable,
    NetworkError,
    AuthenticationError,
    CardDeclined,
    InvalidRequest,
    NotFound,
    RateLimitExceeded,
    ProviderError,
}

impl PaymentErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::GatewayUnavailable => "gateway_unavailable",
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::CardDeclined => "card_declined",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }

    fn intent(latest_charge: Option<&str>) -> PaymentIntent {
        PaymentIntent {
            id: "pi_1".to_string(),
            status: PaymentIntentStatus::Succeeded,
            amount: 1999,
            currency: "usd".to_string(),
            client_secret: None,
            metadata: HashMap::from([("order_id".to_string(), "1001".to_string())]),
            latest_charge: latest_charge.map(str::to_string),
            payment_method_types: vec!["card".to_string()],
            last_error: None,
        }
    }

    #[test]
    fn provider_transaction_id_prefers_charge() {
        assert_eq!(intent(Some("ch_1")).provider_transaction_id(), "ch_1");
        assert_eq!(intent(None).provider_transaction_id(), "pi_1");
    }

    #[test]
    fn intent_resolves_order_from_metadata() {
        assert_eq!(intent(None).order_id(), Some(OrderId::new(1001).unwrap()));
        assert_eq!(intent(None).payment_method_label().as_deref(), Some("card"));
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(PaymentError::network("reset").retryable);
        assert!(!PaymentError::unavailable("no key").retryable);
        assert!(!PaymentError::invalid_request("bad amount").retryable);
    }

    #[test]
    fn unavailability_maps_to_payment_unavailable() {
        let err: DomainError = PaymentError::unavailable("no key").into();
        assert_eq!(err.code, ErrorCode::PaymentUnavailable);
    }

    #[test]
    fn payment_error_display_includes_code() {
        let err = PaymentError::provider("upstream exploded");
        assert_eq!(err.to_string(), "provider_error: upstream exploded");
    }
}
