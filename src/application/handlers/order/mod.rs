//! Order handlers.
//!
//! ## Commands
//! - Placing an order from catalog items
//! - Moving an order along fulfillment (staff)
//!
//! ## Queries
//! - Get an order with its current payment attempt

mod get_order;
mod place_order;
mod update_order_status;

// Commands
pub use place_order::{OrderLine, PlaceOrderCommand, PlaceOrderHandler, PlaceOrderResult};
pub use update_order_status::{
    UpdateOrderStatusCommand, UpdateOrderStatusHandler, UpdateOrderStatusResult,
};

// Queries
pub use get_order::{GetOrderHandler, GetOrderQuery, GetOrderResult};
