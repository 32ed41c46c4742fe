//! Webhook domain module.
//!
//! - `verifier` - Signature verification and replay protection
//! - `event` - Event envelope and the closed `PaymentEvent` enum
//! - `errors` - Webhook errors with HTTP status and retry semantics

mod errors;
mod event;
mod verifier;

pub use errors::WebhookError;
pub use event::{
    order_id_from, ChargePayload, IntentPayload, LastPaymentError, PaymentEvent, StripeEvent,
    StripeEventData, ORDER_ID_METADATA_KEY,
};
pub use verifier::{sign_payload, SignatureHeader, StripeWebhookVerifier};

#[cfg(test)]
pub(crate) use event::StripeEventBuilder;
