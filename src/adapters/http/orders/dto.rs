//! HTTP DTOs for order endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::OrderLine;
use crate::domain::foundation::Timestamp;
use crate::domain::order::{Order, OrderItem, OrderPaymentStatus, OrderStatus};
use crate::domain::payment::{Transaction, TransactionStatus};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: i64,
    pub quantity: u32,
}

impl From<OrderLineRequest> for OrderLine {
    fn from(line: OrderLineRequest) -> Self {
        OrderLine {
            product_id: line.product_id,
            quantity: line.quantity,
        }
    }
}

/// Request to place an order.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderLineRequest>,
    /// Minor units.
    #[serde(default)]
    pub shipping_cost: i64,
    #[serde(default)]
    pub delivery_address_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Staff request to move an order along fulfillment.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct OrderItemResponse {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub subtotal: i64,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.value(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.minor_units(),
            subtotal: item.subtotal.minor_units(),
        }
    }
}

/// The current payment attempt of an order.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub status: TransactionStatus,
    pub amount: i64,
    pub currency: String,
    pub payment_intent_id: Option<String>,
    pub provider_transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Transaction> for TransactionResponse {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.value(),
            status: tx.status,
            amount: tx.amount.minor_units(),
            currency: tx.currency.as_str().to_string(),
            payment_intent_id: tx.payment_intent_id.clone(),
            provider_transaction_id: tx.provider_transaction_id.clone(),
            payment_method: tx.payment_method.clone(),
            error_message: tx.error_message.clone(),
            created_at: rfc3339(&tx.created_at),
            updated_at: rfc3339(&tx.updated_at),
        }
    }
}

/// Order view for API responses. Amounts are in minor units.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
    pub total_amount: i64,
    pub shipping_cost: i64,
    pub currency: String,
    pub payment_method: Option<String>,
    pub delivery_address_id: Option<i64>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl OrderResponse {
    pub fn with_transaction(mut self, transaction: Option<&Transaction>) -> Self {
        self.transaction = transaction.map(TransactionResponse::from);
        self
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.value(),
            order_number: order.order_number.as_str().to_string(),
            status: order.status,
            payment_status: order.payment_status,
            total_amount: order.total_amount.minor_units(),
            shipping_cost: order.shipping_cost.minor_units(),
            currency: order.currency.as_str().to_string(),
            payment_method: order.payment_method.clone(),
            delivery_address_id: order.delivery_address_id,
            notes: order.notes.clone(),
            items: order.items.iter().map(OrderItemResponse::from).collect(),
            transaction: None,
            created_at: rfc3339(&order.created_at),
            updated_at: rfc3339(&order.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOrderStatusResponse {
    pub previous_status: OrderStatus,
    pub order: OrderResponse,
}

fn rfc3339(ts: &Timestamp) -> String {
    ts.as_datetime().to_rfc3339()
}
