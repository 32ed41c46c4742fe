//! Error responses shared by every endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainError;
use crate::domain::order::OrderError;

/// Standard error body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

/// API error type that converts order errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub OrderError);

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(OrderError::from(err))
    }
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            OrderError::NotFound(_) => (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND"),
            OrderError::PaymentNotFound(_) => (StatusCode::NOT_FOUND, "PAYMENT_NOT_FOUND"),
            OrderError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            OrderError::InvalidState { .. } => (StatusCode::CONFLICT, "INVALID_STATE_TRANSITION"),
            OrderError::Conflict(_) => (StatusCode::CONFLICT, "CONCURRENT_UPDATE"),
            OrderError::ValidationFailed { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            OrderError::PaymentUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "PAYMENT_UNAVAILABLE")
            }
            OrderError::PaymentFailed { .. } => (StatusCode::PAYMENT_REQUIRED, "PAYMENT_FAILED"),
            OrderError::Infrastructure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        let body = match &self.0 {
            OrderError::ValidationFailed { field, .. } => ErrorResponse::with_details(
                error_code,
                self.0.message(),
                serde_json::json!({ "field": field }),
            ),
            _ => ErrorResponse::new(error_code, self.0.message()),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::OrderId;

    fn status(err: OrderError) -> StatusCode {
        ApiError(err).status_and_code().0
    }

    #[test]
    fn order_errors_map_to_statuses() {
        assert_eq!(status(OrderError::not_found(OrderId::new(1).unwrap())), StatusCode::NOT_FOUND);
        assert_eq!(status(OrderError::payment_not_found("pi_1")), StatusCode::NOT_FOUND);
        assert_eq!(status(OrderError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status(OrderError::invalid_state("cancelled", "pay")), StatusCode::CONFLICT);
        assert_eq!(status(OrderError::Conflict("stale".into())), StatusCode::CONFLICT);
        assert_eq!(status(OrderError::validation("amount", "bad")), StatusCode::BAD_REQUEST);
        assert_eq!(status(OrderError::PaymentUnavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status(OrderError::payment_failed("declined")), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(
            status(OrderError::infrastructure("pool")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = OrderError::infrastructure("connection refused to 10.0.0.5");
        assert_eq!(err.message(), "An internal error occurred");
    }

    #[test]
    fn error_response_with_details_includes_details() {
        let details = serde_json::json!({"field": "amount"});
        let response = ErrorResponse::with_details("VALIDATION_FAILED", "Invalid", details.clone());
        assert_eq!(response.details, Some(details));
    }
}
