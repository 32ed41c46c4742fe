//! HTTP adapter for payment provider webhooks.
//!
//! - `POST /api/webhooks/stripe` - Signed Stripe events (no caller identity)

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::WebhookResponse;
pub use routes::webhook_routes;
