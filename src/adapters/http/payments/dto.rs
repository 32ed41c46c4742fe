//! HTTP DTOs for payment endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::application::handlers::{
    CheckPaymentAvailabilityResult, ConfirmPaymentResult, CreatePaymentIntentResult,
    PaymentStatusView, RefundPaymentResult,
};
use crate::domain::order::{OrderPaymentStatus, OrderStatus};
use crate::domain::payment::PaymentIntentStatus;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub order_id: i64,
    /// Minor units; must equal the order total.
    pub amount: i64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: String,
    pub order_id: i64,
    #[serde(default)]
    pub payment_method_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundPaymentRequest {
    pub payment_intent_id: String,
    pub order_id: i64,
    /// Partial refund in minor units; omit to refund in full.
    #[serde(default)]
    pub amount: Option<i64>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentIntentResponse {
    pub success: bool,
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
    pub status: PaymentIntentStatus,
}

impl From<CreatePaymentIntentResult> for CreatePaymentIntentResponse {
    fn from(result: CreatePaymentIntentResult) -> Self {
        Self {
            success: true,
            client_secret: result.client_secret,
            payment_intent_id: result.payment_intent_id,
            status: result.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmPaymentResponse {
    pub success: bool,
    pub message: String,
    pub order_id: i64,
}

impl From<ConfirmPaymentResult> for ConfirmPaymentResponse {
    fn from(result: ConfirmPaymentResult) -> Self {
        Self {
            success: result.success,
            message: result.message,
            order_id: result.order_id.value(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusResponse {
    pub id: String,
    pub status: PaymentIntentStatus,
    pub amount: i64,
    pub currency: String,
    pub client_secret: Option<String>,
    pub metadata: HashMap<String, String>,
    pub order_id: i64,
    pub order_status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
}

impl From<PaymentStatusView> for PaymentStatusResponse {
    fn from(view: PaymentStatusView) -> Self {
        Self {
            id: view.payment_intent_id,
            status: view.status,
            amount: view.amount,
            currency: view.currency,
            client_secret: view.client_secret,
            metadata: view.metadata,
            order_id: view.order_id.value(),
            order_status: view.order_status,
            payment_status: view.payment_status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundPaymentResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<String>,
}

impl From<RefundPaymentResult> for RefundPaymentResponse {
    fn from(result: RefundPaymentResult) -> Self {
        Self {
            success: result.success,
            message: result.message,
            refund_id: result.refund_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentAvailabilityResponse {
    pub available: bool,
}

impl From<CheckPaymentAvailabilityResult> for PaymentAvailabilityResponse {
    fn from(result: CheckPaymentAvailabilityResult) -> Self {
        Self {
            available: result.available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refund_request_amount_is_optional() {
        let request: RefundPaymentRequest =
            serde_json::from_str(r#"{"payment_intent_id":"pi_1","order_id":7}"#).unwrap();
        assert_eq!(request.amount, None);
    }

    #[test]
    fn intent_status_serializes_as_provider_string() {
        let response = CreatePaymentIntentResponse {
            success: true,
            client_secret: Some("pi_1_secret".to_string()),
            payment_intent_id: "pi_1".to_string(),
            status: PaymentIntentStatus::RequiresPaymentMethod,
        };
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["status"], "requires_payment_method");
    }

    #[test]
    fn refund_response_omits_missing_refund_id() {
        let json = serde_json::to_value(RefundPaymentResponse {
            success: false,
            message: "Charge already disputed".to_string(),
            refund_id: None,
        })
        .unwrap();
        assert!(json.get("refund_id").is_none());
    }
}
