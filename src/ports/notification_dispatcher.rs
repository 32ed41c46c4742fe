//! Customer notification port.
//!
//! Delivery is best-effort: callers log a failed send and carry on, an order
//! transition never fails because an email did not go out.

use crate::domain::foundation::{DomainError, Money, OrderId, OrderNumber};
use crate::domain::order::OrderStatus;
use async_trait::async_trait;

/// What happened to the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderNotificationKind {
    /// Payment settled and the order is confirmed.
    Confirmed,
    /// Payment refunded; `order_cancelled` is false when fulfillment was too far along.
    Refunded { order_cancelled: bool },
    /// Staff moved the order along its fulfillment lifecycle.
    StatusChanged { from: OrderStatus, to: OrderStatus },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderNotification {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub recipient: Option<String>,
    pub total_amount: Money,
    pub kind: OrderNotificationKind,
}

impl OrderNotification {
    pub fn subject(&self) -> String {
        match &self.kind {
            OrderNotificationKind::Confirmed => {
                format!("Order {} confirmed", self.order_number)
            }
            OrderNotificationKind::Refunded { .. } => {
                format!("Order {} refunded", self.order_number)
            }
            OrderNotificationKind::StatusChanged { to, .. } => {
                format!("Order {} is now {}", self.order_number, to)
            }
        }
    }

    pub fn body(&self) -> String {
        match &self.kind {
            OrderNotificationKind::Confirmed => format!(
                "Thanks! We received your payment of ${} and your order {} is confirmed.",
                self.total_amount, self.order_number
            ),
            OrderNotificationKind::Refunded { order_cancelled: true } => format!(
                "Your order {} has been cancelled and your payment refunded.",
                self.order_number
            ),
            OrderNotificationKind::Refunded { order_cancelled: false } => format!(
                "A refund has been issued for your order {}.",
                self.order_number
            ),
            OrderNotificationKind::StatusChanged { from, to } => format!(
                "Your order {} moved from {} to {}.",
                self.order_number, from, to
            ),
        }
    }
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: OrderNotification) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::OrderNumber;

    fn notification(kind: OrderNotificationKind) -> OrderNotification {
        OrderNotification {
            order_id: OrderId::new(7).unwrap(),
            order_number: OrderNumber::parse("CR-20260301-ABCD1234").unwrap(),
            recipient: Some("alice@example.com".to_string()),
            total_amount: Money::try_new("total", 1999).unwrap(),
            kind,
        }
    }

    #[test]
    fn confirmation_mentions_amount() {
        let n = notification(OrderNotificationKind::Confirmed);
        assert_eq!(n.subject(), "Order CR-20260301-ABCD1234 confirmed");
        assert!(n.body().contains("$19.99"));
    }

    #[test]
    fn status_change_names_both_states() {
        let n = notification(OrderNotificationKind::StatusChanged {
            from: OrderStatus::Ready,
            to: OrderStatus::Shipped,
        });
        assert!(n.subject().ends_with("is now shipped"));
        assert!(n.body().contains("from ready to shipped"));
    }

    #[test]
    fn dispatcher_is_object_safe() {
        fn _accepts_dyn(_d: &dyn NotificationDispatcher) {}
    }
}
