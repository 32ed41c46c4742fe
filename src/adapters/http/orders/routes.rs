//! Axum routes for order endpoints.

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers::{get_order, place_order, update_order_status};
use crate::adapters::http::state::AppState;

/// Customer order routes, mounted at `/api/orders`.
///
/// - `POST /` - Place an order
/// - `GET /:id` - Get an order
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(place_order))
        .route("/:id", get(get_order))
}

/// Staff routes, mounted at `/api/admin/orders`.
///
/// - `PATCH /:id/status` - Update fulfillment status
pub fn admin_order_routes() -> Router<AppState> {
    Router::new().route("/:id/status", patch(update_order_status))
}
