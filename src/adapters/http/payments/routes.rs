//! Axum routes for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    check_payment_availability, confirm_payment, create_payment_intent, get_payment_status,
    refund_payment,
};
use crate::adapters::http::state::AppState;

/// Payment routes, mounted at `/api/payments`.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/intent", post(create_payment_intent))
        .route("/confirm", post(confirm_payment))
        .route("/status/:intent_id", get(get_payment_status))
        .route("/refund", post(refund_payment))
        .route("/available", get(check_payment_availability))
}
