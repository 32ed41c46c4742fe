//! Order and payment errors surfaced to callers.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | Forbidden | 403 |
//! | InvalidState | 409 |
//! | Conflict | 409 |
//! | ValidationFailed | 400 |
//! | PaymentUnavailable | 503 |
//! | PaymentFailed | 402 |
//! | Infrastructure | 500 |
//!
//! `NotFound` deliberately covers "exists but belongs to someone else".

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, ValidationError};

/// Order-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Order does not exist or is not visible to the requester.
    NotFound(OrderId),

    /// Payment intent unknown, or not correlated with a visible order.
    PaymentNotFound(String),

    /// Caller lacks a role required for the operation.
    Forbidden,

    InvalidState {
        current: String,
        attempted: String,
    },

    /// Store rejected a write made against a stale version.
    Conflict(String),

    ValidationFailed {
        field: String,
        message: String,
    },

    /// Payment provider not configured or unreachable.
    PaymentUnavailable,

    /// Provider refused the operation for a reason the caller may act on.
    PaymentFailed {
        reason: String,
    },

    Infrastructure(String),
}

impl OrderError {
    pub fn not_found(id: OrderId) -> Self {
        OrderError::NotFound(id)
    }

    pub fn payment_not_found(intent_id: impl Into<String>) -> Self {
        OrderError::PaymentNotFound(intent_id.into())
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        OrderError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        OrderError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn payment_failed(reason: impl Into<String>) -> Self {
        OrderError::PaymentFailed {
            reason: reason.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        OrderError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            OrderError::NotFound(_) => ErrorCode::OrderNotFound,
            OrderError::PaymentNotFound(_) => ErrorCode::TransactionNotFound,
            OrderError::Forbidden => ErrorCode::Forbidden,
            OrderError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            OrderError::Conflict(_) => ErrorCode::ConcurrencyConflict,
            OrderError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            OrderError::PaymentUnavailable => ErrorCode::PaymentUnavailable,
            OrderError::PaymentFailed { .. } => ErrorCode::PaymentProviderError,
            OrderError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    /// Returns a message that is safe to show to the end user.
    pub fn message(&self) -> String {
        match self {
            OrderError::NotFound(_) => "Order not found".to_string(),
            OrderError::PaymentNotFound(_) => "Payment not found".to_string(),
            OrderError::Forbidden => "You do not have permission to do that".to_string(),
            OrderError::InvalidState { current, attempted } => {
                format!("Cannot {} while the order is {}", attempted, current)
            }
            OrderError::Conflict(_) => {
                "The order was updated concurrently, please retry".to_string()
            }
            OrderError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            OrderError::PaymentUnavailable => "Payment service unavailable".to_string(),
            OrderError::PaymentFailed { reason } => format!("Payment failed: {}", reason),
            OrderError::Infrastructure(_) => "An internal error occurred".to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrderError::Infrastructure(_) | OrderError::Conflict(_) | OrderError::PaymentUnavailable
        )
    }
}

impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Keep the internal detail in logs.
            OrderError::Infrastructure(detail) | OrderError::Conflict(detail) => {
                write!(f, "{}: {}", self.code(), detail)
            }
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for OrderError {}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => {
                let field = err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "request".to_string());
                OrderError::ValidationFailed {
                    field,
                    message: err.message,
                }
            }
            ErrorCode::InvalidStateTransition => OrderError::InvalidState {
                current: err
                    .details
                    .get("state")
                    .cloned()
                    .unwrap_or_else(|| "in its current state".to_string()),
                attempted: err
                    .details
                    .get("action")
                    .map(|action| format!("{} the order", action))
                    .unwrap_or_else(|| "change the order".to_string()),
            },
            ErrorCode::ConcurrencyConflict => OrderError::Conflict(err.message),
            ErrorCode::PaymentUnavailable => OrderError::PaymentUnavailable,
            ErrorCode::Forbidden | ErrorCode::Unauthorized => OrderError::Forbidden,
            _ => OrderError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for OrderError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { ref field }
            | ValidationError::OutOfRange { ref field, .. }
            | ValidationError::InvalidFormat { ref field, .. } => OrderError::ValidationFailed {
                field: field.clone(),
                message: err.to_string(),
            },
            ValidationError::InvalidTransition { from, to } => OrderError::InvalidState {
                current: from,
                attempted: format!("move to {}", to),
            },
        }
    }
}

impl From<OrderError> for DomainError {
    fn from(err: OrderError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
