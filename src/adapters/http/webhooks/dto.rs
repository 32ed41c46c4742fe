//! Webhook acknowledgement body.

use serde::{Deserialize, Serialize};

/// Body returned to the provider. Only the status code drives its retries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
}

impl WebhookResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
