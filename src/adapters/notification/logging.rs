//! Dispatcher used when no e-mail provider is configured.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::ports::{NotificationDispatcher, OrderNotification};

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotificationDispatcher;

#[async_trait]
impl NotificationDispatcher for LoggingNotificationDispatcher {
    async fn dispatch(&self, notification: OrderNotification) -> Result<(), DomainError> {
        tracing::info!(
            order_id = %notification.order_id,
            order_number = %notification.order_number,
            recipient = notification.recipient.as_deref().unwrap_or("-"),
            subject = %notification.subject(),
            "Notification (not sent, no e-mail provider configured)"
        );
        Ok(())
    }
}
