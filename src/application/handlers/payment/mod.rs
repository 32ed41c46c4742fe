//! Payment handlers.
//!
//! ## Commands
//! - Creating a payment intent for a payable order
//! - Confirming an intent and reconciling the result
//! - Refunding a settled payment
//!
//! ## Queries
//! - Intent status (reconciles a settled intent on read)
//! - Gateway availability

mod check_payment_availability;
mod confirm_payment;
mod create_payment_intent;
mod get_payment_status;
mod refund_payment;

use crate::domain::order::OrderError;
use crate::ports::{PaymentError, PaymentErrorCode};

// Commands
pub use confirm_payment::{ConfirmPaymentCommand, ConfirmPaymentHandler, ConfirmPaymentResult};
pub use create_payment_intent::{
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, CreatePaymentIntentResult,
};
pub use refund_payment::{RefundPaymentCommand, RefundPaymentHandler, RefundPaymentResult};

// Queries
pub use check_payment_availability::{
    CheckPaymentAvailabilityHandler, CheckPaymentAvailabilityResult,
};
pub use get_payment_status::{GetPaymentStatusHandler, GetPaymentStatusQuery, PaymentStatusView};

/// Maps a gateway failure onto the caller-facing error.
pub(crate) fn gateway_error(intent_id: &str, err: PaymentError) -> OrderError {
    match err.code {
        PaymentErrorCode::GatewayUnavailable
        | PaymentErrorCode::NetworkError
        | PaymentErrorCode::AuthenticationError
        | PaymentErrorCode::RateLimitExceeded => {
            tracing::warn!(intent_id, error = %err, "Payment gateway unavailable");
            OrderError::PaymentUnavailable
        }
        PaymentErrorCode::NotFound => OrderError::payment_not_found(intent_id),
        PaymentErrorCode::CardDeclined => OrderError::payment_failed(err.message),
        PaymentErrorCode::InvalidRequest => OrderError::validation("payment", err.message),
        PaymentErrorCode::ProviderError => {
            OrderError::infrastructure(format!("payment provider: {}", err))
        }
    }
}
