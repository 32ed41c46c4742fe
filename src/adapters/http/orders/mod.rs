//! HTTP adapter for order endpoints.
//!
//! - `POST /api/orders` - Place an order
//! - `GET /api/orders/:id` - Get an order with its current payment attempt
//! - `PATCH /api/admin/orders/:id/status` - Move an order along fulfillment (staff)

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::{admin_order_routes, order_routes};
