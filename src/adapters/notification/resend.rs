//! Resend e-mail dispatcher.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{NotificationDispatcher, OrderNotification};

pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";

#[derive(Clone)]
pub struct ResendConfig {
    pub api_key: SecretString,
    /// Formatted `From` header, e.g. `Creamery <orders@example.com>`.
    pub from: String,
    pub api_base_url: String,
}

pub struct ResendNotificationDispatcher {
    config: ResendConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    text: String,
}

impl ResendNotificationDispatcher {
    pub fn new(config: ResendConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client for Resend");
                reqwest::Client::new()
            });
        Self {
            config,
            http_client,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.config.api_base_url.trim_end_matches('/'))
    }
}

fn delivery_error(message: impl Into<String>) -> DomainError {
    DomainError::new(ErrorCode::InternalError, message)
}

#[async_trait]
impl NotificationDispatcher for ResendNotificationDispatcher {
    async fn dispatch(&self, notification: OrderNotification) -> Result<(), DomainError> {
        let Some(recipient) = notification.recipient.as_deref() else {
            tracing::debug!(
                order_id = %notification.order_id,
                "No contact e-mail on order, skipping notification"
            );
            return Ok(());
        };

        let request = SendEmailRequest {
            from: &self.config.from,
            to: [recipient],
            subject: notification.subject(),
            text: notification.body(),
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| delivery_error(format!("Resend request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(delivery_error(format!("Resend API error {}: {}", status, body)));
        }

        tracing::info!(
            order_id = %notification.order_id,
            subject = %request.subject,
            "Notification sent"
        );
        Ok(())
    }
}
