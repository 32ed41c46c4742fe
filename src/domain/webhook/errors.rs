//! Webhook error types.
//!
//! The status code decides the provider's retry behaviour: 2xx acknowledges,
//! 4xx is final, 5xx makes the provider deliver the event again later.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur while verifying or applying a provider event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    #[error("Webhook verification is not configured")]
    NotConfigured,

    #[error("Missing signature header")]
    MissingSignature,

    #[error("Malformed signature header: {0}")]
    MalformedHeader(String),

    #[error("Invalid signature")]
    InvalidSignature,

    /// Signed longer ago than the replay window allows.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Signed in the future beyond the clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    #[error("Test-mode event rejected by a live-mode endpoint")]
    LivemodeMismatch,

    #[error("Parse error: {0}")]
    ParseError(String),

    /// Order row changed underneath us; the next delivery will re-read it.
    #[error("Concurrent update: {0}")]
    Conflict(String),

    /// Provider lookup needed to resolve the event failed.
    #[error("Payment provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this event.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Conflict(_) | WebhookError::Provider(_) | WebhookError::Database(_)
        )
    }

    /// True for failures of the trust boundary itself.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingSignature
                | WebhookError::MalformedHeader(_)
                | WebhookError::InvalidSignature
                | WebhookError::TimestampOutOfRange
                | WebhookError::InvalidTimestamp
                | WebhookError::LivemodeMismatch
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingSignature
            | WebhookError::MalformedHeader(_)
            | WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::LivemodeMismatch
            | WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,

            WebhookError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,

            WebhookError::Conflict(_) | WebhookError::Provider(_) | WebhookError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
