//! Top-level router.

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;

use super::middleware::identity_middleware;
use super::orders::{admin_order_routes, order_routes};
use super::payments::payment_routes;
use super::state::AppState;
use super::webhooks::webhook_routes;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the complete API router.
///
/// # Routes
///
/// - `/api/orders`, `/api/admin/orders`, `/api/payments` - identity required
/// - `/api/webhooks/stripe` - signature verified
/// - `/health`
///
/// Transport layers (tracing, timeout, CORS) are applied by the binary.
pub fn api_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .nest("/orders", order_routes())
        .nest("/admin/orders", admin_order_routes())
        .nest("/payments", payment_routes())
        .layer(middleware::from_fn(identity_middleware));

    Router::new()
        .nest("/api", authenticated.nest("/webhooks", webhook_routes()))
        .route("/health", get(health))
        .with_state(state)
}
