//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations. Everything
//! that touches payment state goes through the shared `PaymentReconciler`.

pub mod order;
pub mod payment;
pub mod webhook;

pub use order::{
    GetOrderHandler, GetOrderQuery, GetOrderResult, OrderLine, PlaceOrderCommand,
    PlaceOrderHandler, PlaceOrderResult, UpdateOrderStatusCommand, UpdateOrderStatusHandler,
    UpdateOrderStatusResult,
};
pub use payment::{
    CheckPaymentAvailabilityHandler, CheckPaymentAvailabilityResult, ConfirmPaymentCommand,
    ConfirmPaymentHandler, ConfirmPaymentResult, CreatePaymentIntentCommand,
    CreatePaymentIntentHandler, CreatePaymentIntentResult, GetPaymentStatusHandler,
    GetPaymentStatusQuery, PaymentStatusView, RefundPaymentCommand, RefundPaymentHandler,
    RefundPaymentResult,
};
pub use webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, HandlePaymentWebhookResult,
    WebhookDisposition,
};
