//! HTTP handler for provider webhooks.

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use super::dto::WebhookResponse;
use crate::adapters::http::state::AppState;
use crate::application::handlers::HandlePaymentWebhookCommand;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// POST /api/webhooks/stripe - Handle Stripe webhook events
///
/// The body must stay untouched until the signature is checked, so it is
/// taken as raw bytes.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    match state.webhook_handler().handle(cmd).await {
        Ok(result) => (StatusCode::OK, Json(WebhookResponse::ok(result.message()))).into_response(),
        Err(e) => {
            let status = e.status_code();
            if e.is_verification_failure() {
                tracing::warn!(error = %e, "Webhook verification failed");
            } else if e.is_retryable() {
                tracing::error!(error = %e, "Webhook processing failed; provider will retry");
            } else {
                tracing::warn!(error = %e, status = %status, "Webhook rejected");
            }
            (status, Json(WebhookResponse::failed(e.to_string()))).into_response()
        }
    }
}
