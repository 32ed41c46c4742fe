//! Stripe REST objects as they come back over the wire.
//!
//! Only fields we read are declared; serde ignores the rest.

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::payment::PaymentIntentStatus;
use crate::ports::PaymentIntent;

/// `payment_intent` object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub latest_charge: Option<ExpandableId>,
    #[serde(default)]
    pub payment_method_types: Vec<String>,
    #[serde(default)]
    pub last_payment_error: Option<StripeApiError>,
}

impl From<StripePaymentIntent> for PaymentIntent {
    fn from(pi: StripePaymentIntent) -> Self {
        PaymentIntent {
            id: pi.id,
            status: PaymentIntentStatus::parse(&pi.status),
            amount: pi.amount,
            currency: pi.currency,
            client_secret: pi.client_secret,
            metadata: pi.metadata,
            latest_charge: pi.latest_charge.map(ExpandableId::into_id),
            payment_method_types: pi.payment_method_types,
            last_error: pi.last_payment_error.and_then(|e| e.message),
        }
    }
}

/// A reference Stripe may return either as an id or as the expanded object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExpandableId {
    Id(String),
    Object { id: String },
}

impl ExpandableId {
    pub fn into_id(self) -> String {
        match self {
            ExpandableId::Id(id) | ExpandableId::Object { id } => id,
        }
    }
}

/// `refund` object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeRefund {
    pub id: String,
    pub amount: i64,
    pub status: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

impl StripeRefund {
    /// `failed` and `canceled` refunds did not move money.
    pub fn is_failed(&self) -> bool {
        matches!(self.status.as_deref(), Some("failed") | Some("canceled"))
    }
}

/// Body of every non-2xx response: `{"error": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorEnvelope {
    pub error: StripeApiError,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeApiError {
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub decline_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Present on card errors raised while confirming.
    #[serde(default)]
    pub payment_intent: Option<Box<StripePaymentIntent>>,
}

impl StripeApiError {
    pub fn is_card_error(&self) -> bool {
        self.error_type.as_deref() == Some("card_error")
    }

    pub fn display_message(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.code.clone())
            .unwrap_or_else(|| "unknown Stripe error".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn intent_maps_to_port_type() {
        let raw: StripePaymentIntent = serde_json::from_value(json!({
            "id": "pi_123",
            "object": "payment_intent",
            "status": "requires_payment_method",
            "amount": 1999,
            "currency": "usd",
            "client_secret": "pi_123_secret_abc",
            "metadata": {"order_id": "1001"},
            "latest_charge": null,
            "payment_method_types": ["card"]
        }))
        .unwrap();

        let intent: PaymentIntent = raw.into();
        assert_eq!(intent.status, PaymentIntentStatus::RequiresPaymentMethod);
        assert_eq!(intent.client_secret.as_deref(), Some("pi_123_secret_abc"));
        assert_eq!(intent.order_id().map(|id| id.value()), Some(1001));
    }

    #[test]
    fn expanded_latest_charge_is_flattened() {
        let raw: StripePaymentIntent = serde_json::from_value(json!({
            "id": "pi_1",
            "status": "succeeded",
            "amount": 100,
            "currency": "usd",
            "latest_charge": {"id": "ch_9", "object": "charge"}
        }))
        .unwrap();
        let intent: PaymentIntent = raw.into();
        assert_eq!(intent.latest_charge.as_deref(), Some("ch_9"));
    }

    #[test]
    fn card_error_envelope_parses() {
        let envelope: StripeErrorEnvelope = serde_json::from_value(json!({
            "error": {
                "type": "card_error",
                "code": "card_declined",
                "decline_code": "insufficient_funds",
                "message": "Your card has insufficient funds."
            }
        }))
        .unwrap();
        assert!(envelope.error.is_card_error());
        assert_eq!(envelope.error.display_message(), "Your card has insufficient funds.");
    }

    #[test]
    fn card_error_carries_the_declined_intent() {
        let envelope: StripeErrorEnvelope = serde_json::from_value(json!({
            "error": {
                "type": "card_error",
                "code": "card_declined",
                "message": "Your card was declined.",
                "payment_intent": {
                    "id": "pi_7",
                    "status": "requires_payment_method",
                    "amount": 1199,
                    "currency": "usd",
                    "metadata": { "order_id": "1001" },
                    "last_payment_error": {
                        "type": "card_error",
                        "message": "Your card was declined."
                    }
                }
            }
        }))
        .unwrap();

        let intent: PaymentIntent = (*envelope.error.payment_intent.unwrap()).into();
        assert_eq!(intent.id, "pi_7");
        assert_eq!(intent.status, PaymentIntentStatus::RequiresPaymentMethod);
        assert_eq!(intent.last_error.as_deref(), Some("Your card was declined."));
    }

    #[test]
    fn failed_refund_is_detected() {
        let refund: StripeRefund =
            serde_json::from_value(json!({"id": "re_1", "amount": 100, "status": "failed"}))
                .unwrap();
        assert!(refund.is_failed());
    }
}
