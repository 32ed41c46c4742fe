//! Order fulfillment and order payment state machines.
//!
//! Fulfillment: `pending → confirmed → preparing → ready → shipped → delivered`,
//! with `cancelled` reachable from `pending`, `confirmed` and `preparing`.
//! Nothing ever leads back to `pending`.

use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, awaiting payment.
    Pending,
    /// Paid; the shop has been told to make it.
    Confirmed,
    Preparing,
    Ready,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Position along the happy path; `Cancelled` sorts last.
    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Confirmed => 1,
            OrderStatus::Preparing => 2,
            OrderStatus::Ready => 3,
            OrderStatus::Shipped => 4,
            OrderStatus::Delivered => 5,
            OrderStatus::Cancelled => 6,
        }
    }

    /// True once the order has moved beyond `pending` in any direction.
    pub fn is_past_pending(&self) -> bool {
        *self != OrderStatus::Pending
    }

    /// True when this status is at or beyond `other` on the lifecycle.
    pub fn is_at_least(&self, other: OrderStatus) -> bool {
        self.rank() >= other.rank()
    }

    pub fn is_cancellable(&self) -> bool {
        self.can_transition_to(&OrderStatus::Cancelled)
    }
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Pending, Confirmed)
                | (Confirmed, Preparing)
                | (Preparing, Ready)
                | (Ready, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Preparing, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Pending => vec![Confirmed, Cancelled],
            Confirmed => vec![Preparing, Cancelled],
            Preparing => vec![Ready, Cancelled],
            Ready => vec![Shipped],
            Shipped => vec![Delivered],
            Delivered => vec![],
            Cancelled => vec![],
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format("status", format!("unknown order status '{}'", s))
            })
    }
}

/// Settlement status of an order, as seen from the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl OrderPaymentStatus {
    pub const ALL: [OrderPaymentStatus; 4] = [
        OrderPaymentStatus::Pending,
        OrderPaymentStatus::Completed,
        OrderPaymentStatus::Failed,
        OrderPaymentStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPaymentStatus::Pending => "pending",
            OrderPaymentStatus::Completed => "completed",
            OrderPaymentStatus::Failed => "failed",
            OrderPaymentStatus::Refunded => "refunded",
        }
    }

    /// Whether a new payment attempt may be started.
    pub fn accepts_payment(&self) -> bool {
        matches!(self, OrderPaymentStatus::Pending | OrderPaymentStatus::Failed)
    }
}

impl StateMachine for OrderPaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderPaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Completed)
                | (Pending, Failed)
                | (Failed, Completed)
                | (Failed, Pending)
                | (Completed, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderPaymentStatus::*;
        match self {
            Pending => vec![Completed, Failed],
            Failed => vec![Completed, Pending],
            Completed => vec![Refunded],
            Refunded => vec![],
        }
    }
}

impl fmt::Display for OrderPaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderPaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderPaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "payment_status",
                    format!("unknown payment status '{}'", s),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn happy_path_is_linear() {
        let mut status = OrderStatus::Pending;
        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            status = status.transition_to(next).unwrap();
        }
        assert!(status.is_terminal());
    }

    #[test]
    fn cancellation_only_before_ready() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Confirmed.is_cancellable());
        assert!(OrderStatus::Preparing.is_cancellable());
        assert!(!OrderStatus::Ready.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn cancelled_and_delivered_are_terminal() {
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled
            .transition_to(OrderStatus::Confirmed)
            .is_err());
    }

    #[test]
    fn status_strings_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        for status in OrderPaymentStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderPaymentStatus>().unwrap(), status);
        }
        assert!("archived".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn payment_can_be_retried_after_failure() {
        assert!(OrderPaymentStatus::Failed.can_transition_to(&OrderPaymentStatus::Completed));
        assert!(OrderPaymentStatus::Failed.accepts_payment());
        assert!(!OrderPaymentStatus::Completed.accepts_payment());
    }

    #[test]
    fn refund_requires_completed_payment() {
        assert!(OrderPaymentStatus::Completed.can_transition_to(&OrderPaymentStatus::Refunded));
        assert!(!OrderPaymentStatus::Pending.can_transition_to(&OrderPaymentStatus::Refunded));
        assert!(OrderPaymentStatus::Refunded.is_terminal());
    }

    fn any_order_status() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(OrderStatus::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn no_transition_ever_returns_to_pending(from in any_order_status()) {
            prop_assert!(!from.can_transition_to(&OrderStatus::Pending));
        }

        #[test]
        fn transitions_only_move_forward(from in any_order_status(), to in any_order_status()) {
            if from.can_transition_to(&to) {
                prop_assert!(to.is_at_least(from));
                prop_assert_ne!(from, to);
            }
        }

        #[test]
        fn valid_transitions_agree_with_can_transition(from in any_order_status(), to in any_order_status()) {
            prop_assert_eq!(from.can_transition_to(&to), from.valid_transitions().contains(&to));
        }

        #[test]
        fn any_walk_from_terminal_state_is_rejected(
            start in prop::sample::select(vec![OrderStatus::Delivered, OrderStatus::Cancelled]),
            target in any_order_status(),
        ) {
            prop_assert!(start.transition_to(target).is_err());
        }
    }
}
