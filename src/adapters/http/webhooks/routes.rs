//! Axum routes for webhooks.

use axum::{routing::post, Router};

use super::handlers::handle_stripe_webhook;
use crate::adapters::http::state::AppState;

/// Webhook routes, mounted at `/api/webhooks`.
///
/// Kept apart from the authenticated routes; deliveries are trusted by
/// signature, not by caller identity.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}
