//! Webhook handlers.
//!
//! ## Commands
//! - Processing signed payment provider events

mod handle_payment_webhook;

pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, HandlePaymentWebhookResult,
    WebhookDisposition,
};
