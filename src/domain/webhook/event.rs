//! Provider event envelope and the closed set of events we act on.
//!
//! The envelope is decoded first; its `data.object` is only interpreted once
//! the type tag has been mapped onto [`PaymentEvent`], so adding a new event
//! kind means adding a variant the compiler will chase through every match.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::foundation::OrderId;
use crate::domain::payment::PaymentIntentStatus;

use super::WebhookError;

/// Metadata key correlating a provider object with a local order.
pub const ORDER_ID_METADATA_KEY: &str = "order_id";

/// Provider webhook event (only the fields we use).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// `evt_...`
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix seconds.
    pub created: i64,

    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,

    #[serde(default)]
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// Shape depends on `event_type`.
    pub object: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<serde_json::Value>,
}

impl StripeEvent {
    fn object_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, WebhookError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| {
            WebhookError::ParseError(format!("{} object: {}", self.event_type, e))
        })
    }
}

/// `last_payment_error` on an intent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LastPaymentError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// The parts of a payment intent object carried in events.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntentPayload {
    pub id: String,
    pub status: PaymentIntentStatus,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default, deserialize_with = "expandable_id")]
    pub latest_charge: Option<String>,
    #[serde(default)]
    pub payment_method_types: Vec<String>,
    #[serde(default)]
    pub last_payment_error: Option<LastPaymentError>,
}

impl IntentPayload {
    pub fn order_id(&self) -> Option<OrderId> {
        order_id_from(&self.metadata)
    }

    pub fn failure_message(&self) -> Option<String> {
        self.last_payment_error.as_ref().and_then(|e| e.message.clone())
    }
}

/// The parts of a charge object carried in refund events.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChargePayload {
    pub id: String,
    #[serde(default, deserialize_with = "expandable_id")]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub amount_refunded: i64,
    #[serde(default)]
    pub refunded: bool,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Events the reconciler understands.
#[derive(Debug, Clone)]
pub enum PaymentEvent {
    PaymentSucceeded(IntentPayload),
    PaymentFailed(IntentPayload),
    ChargeRefunded(ChargePayload),
    AmountCapturableUpdated(IntentPayload),
    /// Acknowledged and otherwise ignored.
    Unsupported(String),
}

impl PaymentEvent {
    pub const PAYMENT_SUCCEEDED: &'static str = "payment_intent.succeeded";
    pub const PAYMENT_FAILED: &'static str = "payment_intent.payment_failed";
    pub const CHARGE_REFUNDED: &'static str = "charge.refunded";
    pub const AMOUNT_CAPTURABLE_UPDATED: &'static str = "payment_intent.amount_capturable_updated";

    /// Maps the envelope's type tag onto a variant and decodes its object.
    pub fn from_envelope(event: &StripeEvent) -> Result<Self, WebhookError> {
        Ok(match event.event_type.as_str() {
            Self::PAYMENT_SUCCEEDED => Self::PaymentSucceeded(event.object_as()?),
            Self::PAYMENT_FAILED => Self::PaymentFailed(event.object_as()?),
            Self::CHARGE_REFUNDED => Self::ChargeRefunded(event.object_as()?),
            Self::AMOUNT_CAPTURABLE_UPDATED => Self::AmountCapturableUpdated(event.object_as()?),
            other => Self::Unsupported(other.to_string()),
        })
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::PaymentSucceeded(_) => Self::PAYMENT_SUCCEEDED,
            Self::PaymentFailed(_) => Self::PAYMENT_FAILED,
            Self::ChargeRefunded(_) => Self::CHARGE_REFUNDED,
            Self::AmountCapturableUpdated(_) => Self::AMOUNT_CAPTURABLE_UPDATED,
            Self::Unsupported(tag) => tag,
        }
    }
}

pub fn order_id_from(metadata: &HashMap<String, String>) -> Option<OrderId> {
    metadata.get(ORDER_ID_METADATA_KEY)?.parse().ok()
}

/// Accepts either an id string or an expanded object carrying `id`.
fn expandable_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Expandable {
        Id(String),
        Object { id: String },
    }

    Ok(Option::<Expandable>::deserialize(deserializer)?.map(|e| match e {
        Expandable::Id(id) | Expandable::Object { id } => id,
    }))
}

/// Builder for test events.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    livemode: bool,
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new(event_type: &str) -> Self {
        Self {
            id: "evt_test_1".to_string(),
            event_type: event_type.to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
            livemode: false,
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
                previous_attributes: None,
            },
            livemode: self.livemode,
            api_version: Some("2024-06-20".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_succeeded_intent_with_metadata() {
        let event = StripeEventBuilder::new("payment_intent.succeeded")
            .object(json!({
                "id": "pi_1",
                "object": "payment_intent",
                "status": "succeeded",
                "amount": 1999,
                "currency": "usd",
                "metadata": {"order_id": "1001"},
                "latest_charge": "ch_1"
            }))
            .build();

        match PaymentEvent::from_envelope(&event).unwrap() {
            PaymentEvent::PaymentSucceeded(intent) => {
                assert_eq!(intent.id, "pi_1");
                assert_eq!(intent.order_id(), Some(OrderId::new(1001).unwrap()));
                assert_eq!(intent.latest_charge.as_deref(), Some("ch_1"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_type_is_unsupported_not_an_error() {
        let event = StripeEventBuilder::new("customer.created").build();
        match PaymentEvent::from_envelope(&event).unwrap() {
            PaymentEvent::Unsupported(tag) => assert_eq!(tag, "customer.created"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn known_type_with_wrong_object_is_parse_error() {
        let event = StripeEventBuilder::new("charge.refunded")
            .object(json!({"no_id": true}))
            .build();
        assert!(matches!(
            PaymentEvent::from_envelope(&event),
            Err(WebhookError::ParseError(_))
        ));
    }

    #[test]
    fn charge_accepts_expanded_payment_intent() {
        let event = StripeEventBuilder::new("charge.refunded")
            .object(json!({
                "id": "ch_1",
                "payment_intent": {"id": "pi_9", "object": "payment_intent"},
                "amount_refunded": 500,
                "refunded": false
            }))
            .build();
        match PaymentEvent::from_envelope(&event).unwrap() {
            PaymentEvent::ChargeRefunded(charge) => {
                assert_eq!(charge.payment_intent.as_deref(), Some("pi_9"));
                assert_eq!(charge.amount_refunded, 500);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unparsable_order_metadata_resolves_to_none() {
        let mut metadata = HashMap::new();
        metadata.insert(ORDER_ID_METADATA_KEY.to_string(), "not-a-number".to_string());
        assert_eq!(order_id_from(&metadata), None);
        assert_eq!(order_id_from(&HashMap::new()), None);
    }

    #[test]
    fn failure_message_comes_from_last_payment_error() {
        let intent: IntentPayload = serde_json::from_value(json!({
            "id": "pi_2",
            "status": "requires_payment_method",
            "last_payment_error": {"code": "card_declined", "message": "Your card was declined."}
        }))
        .unwrap();
        assert_eq!(intent.failure_message().as_deref(), Some("Your card was declined."));
    }
}
