//! Order aggregate.
//!
//! An order is created at checkout in `pending`/`pending` and afterwards only
//! changes through the methods below, each of which reports whether it
//! actually changed anything. The reconciler relies on that to stay idempotent
//! when the same provider event is applied more than once.
//!
//! # Invariants
//!
//! - `order_number` is assigned once and never changes
//! - `status` and `payment_status` only move along their state machines
//! - `items` are frozen snapshots; catalog edits never reach them
//! - `total_amount == sum(items.subtotal) + shipping_cost`

use crate::domain::foundation::{
    Currency, DomainError, ErrorCode, Money, OrderId, OrderNumber, OwnedByUser, ProductId,
    StateMachine, Timestamp, UserId, ValidationError,
};
use serde::{Deserialize, Serialize};

use super::{OrderPaymentStatus, OrderStatus};

pub const MAX_ITEM_QUANTITY: u32 = 99;
pub const MAX_NOTES_LEN: usize = 500;

/// A line item frozen at the time of purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl OrderItem {
    /// Copies the product's current name and price into a line item.
    pub fn snapshot(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, ValidationError> {
        let product_name = product_name.into();
        if product_name.trim().is_empty() {
            return Err(ValidationError::empty_field("product_name"));
        }
        if quantity == 0 || quantity > MAX_ITEM_QUANTITY {
            return Err(ValidationError::out_of_range(
                "quantity",
                1,
                i64::from(MAX_ITEM_QUANTITY),
                i64::from(quantity),
            ));
        }
        let subtotal = unit_price.checked_mul(i64::from(quantity)).ok_or_else(|| {
            ValidationError::invalid_format("subtotal", "line total overflows")
        })?;

        Ok(Self {
            product_id,
            product_name,
            quantity,
            unit_price,
            subtotal,
        })
    }
}

/// An order that has been validated but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub contact_email: Option<String>,
    pub total_amount: Money,
    pub shipping_cost: Money,
    pub currency: Currency,
    pub delivery_address_id: Option<i64>,
    pub notes: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: Timestamp,
}

impl NewOrder {
    /// Builds a checkout from already-snapshotted items.
    pub fn checkout(
        user_id: UserId,
        items: Vec<OrderItem>,
        shipping_cost: Money,
        currency: Currency,
        delivery_address_id: Option<i64>,
        notes: Option<String>,
        contact_email: Option<String>,
    ) -> Result<Self, ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::empty_field("items"));
        }

        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if let Some(n) = &notes {
            let len = n.chars().count();
            if len > MAX_NOTES_LEN {
                return Err(ValidationError::out_of_range(
                    "notes",
                    0,
                    MAX_NOTES_LEN as i64,
                    len as i64,
                ));
            }
        }

        let total_amount = items
            .iter()
            .try_fold(shipping_cost, |acc, item| acc.checked_add(item.subtotal))
            .ok_or_else(|| ValidationError::invalid_format("total_amount", "order total overflows"))?;

        let created_at = Timestamp::now();
        Ok(Self {
            order_number: OrderNumber::generate(created_at.date()),
            user_id,
            contact_email,
            total_amount,
            shipping_cost,
            currency,
            delivery_address_id,
            notes,
            items,
            created_at,
        })
    }

    /// Attaches the store-assigned id.
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            order_number: self.order_number,
            user_id: self.user_id,
            contact_email: self.contact_email,
            status: OrderStatus::Pending,
            payment_status: OrderPaymentStatus::Pending,
            total_amount: self.total_amount,
            shipping_cost: self.shipping_cost,
            currency: self.currency,
            delivery_address_id: self.delivery_address_id,
            payment_method: None,
            notes: self.notes,
            items: self.items,
            version: 1,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// What a refund did to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefundEffect {
    pub payment_refunded: bool,
    pub order_cancelled: bool,
}

impl RefundEffect {
    pub fn changed(&self) -> bool {
        self.payment_refunded || self.order_cancelled
    }
}

/// Order aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub contact_email: Option<String>,
    pub status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
    pub total_amount: Money,
    pub shipping_cost: Money,
    pub currency: Currency,
    pub delivery_address_id: Option<i64>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItem>,

    /// Optimistic concurrency token, bumped by the store on every update.
    pub version: i32,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    /// Whether the customer may start (or restart) a payment attempt.
    pub fn is_payable(&self) -> bool {
        self.status == OrderStatus::Pending && self.payment_status.accepts_payment()
    }

    /// Moves a failed payment back to pending when a new attempt starts.
    pub fn begin_payment_attempt(&mut self) -> Result<bool, DomainError> {
        if !self.is_payable() {
            return Err(self.invalid_transition("start a payment for"));
        }
        if self.payment_status == OrderPaymentStatus::Failed {
            self.payment_status = self.payment_status.transition_to(OrderPaymentStatus::Pending)?;
            self.touch();
            return Ok(true);
        }
        Ok(false)
    }

    /// Records a successful settlement.
    ///
    /// Returns `Ok(false)` when the order already reflects it. A cancelled or
    /// refunded order is never resurrected.
    pub fn mark_paid(&mut self, payment_method: Option<&str>) -> Result<bool, DomainError> {
        if self.status == OrderStatus::Cancelled
            || self.payment_status == OrderPaymentStatus::Refunded
        {
            return Err(self.invalid_transition("confirm payment for"));
        }

        let mut changed = false;
        if self.status == OrderStatus::Pending {
            self.status = self.status.transition_to(OrderStatus::Confirmed)?;
            changed = true;
        }
        if self.payment_status != OrderPaymentStatus::Completed {
            self.payment_status = self
                .payment_status
                .transition_to(OrderPaymentStatus::Completed)?;
            changed = true;
        }
        if changed {
            if let Some(method) = payment_method {
                self.payment_method = Some(method.to_string());
            }
            self.touch();
        }
        Ok(changed)
    }

    /// Records a failed attempt. Fulfillment status is left alone, so a
    /// confirmed order is never downgraded by a late failure event.
    pub fn mark_payment_failed(&mut self) -> bool {
        if self.payment_status == OrderPaymentStatus::Pending {
            self.payment_status = OrderPaymentStatus::Failed;
            self.touch();
            return true;
        }
        false
    }

    /// Refunds the payment and cancels the order where the lifecycle allows.
    ///
    /// An order that has progressed past `preparing` keeps its status; only
    /// the payment side is marked refunded.
    pub fn apply_refund(&mut self) -> Result<RefundEffect, DomainError> {
        let mut effect = RefundEffect::default();

        match self.payment_status {
            OrderPaymentStatus::Refunded => {}
            OrderPaymentStatus::Completed => {
                self.payment_status = OrderPaymentStatus::Refunded;
                effect.payment_refunded = true;
            }
            _ => return Err(self.invalid_transition("refund")),
        }

        if self.status.is_cancellable() {
            self.status = OrderStatus::Cancelled;
            effect.order_cancelled = true;
        }

        if effect.changed() {
            self.touch();
        }
        Ok(effect)
    }

    /// Moves fulfillment forward on behalf of shop staff.
    ///
    /// Confirmation belongs to the payment flow, so staff cannot confirm
    /// an unpaid order here.
    pub fn advance_fulfillment(&mut self, target: OrderStatus) -> Result<(), DomainError> {
        if target == OrderStatus::Confirmed {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Orders are confirmed by payment, not manually",
            ));
        }
        self.status = self.status.transition_to(target)?;
        self.touch();
        Ok(())
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }

    fn invalid_transition(&self, action: &str) -> DomainError {
        DomainError::new(
            ErrorCode::InvalidStateTransition,
            format!(
                "Cannot {} order {} in status {} with payment {}",
                action, self.id, self.status, self.payment_status
            ),
        )
        .with_detail("order_id", self.id.to_string())
        .with_detail("action", action)
        .with_detail("state", format!("{} with payment {}", self.status, self.payment_status))
    }
}

impl OwnedByUser for Order {
    fn owner_id(&self) -> &UserId {
        &self.user_id
    }
}
