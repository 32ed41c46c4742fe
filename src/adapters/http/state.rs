//! Shared application state and handler factories.

use std::sync::Arc;

use crate::application::handlers::{
    CheckPaymentAvailabilityHandler, ConfirmPaymentHandler, CreatePaymentIntentHandler,
    GetOrderHandler, GetPaymentStatusHandler, HandlePaymentWebhookHandler, PlaceOrderHandler,
    RefundPaymentHandler, UpdateOrderStatusHandler,
};
use crate::application::PaymentReconciler;
use crate::domain::foundation::Currency;
use crate::domain::webhook::StripeWebhookVerifier;
use crate::ports::{
    NotificationDispatcher, OrderRepository, PaymentGateway, ProductCatalog, TransactionLedger,
    WebhookEventRepository,
};

/// Everything the HTTP layer needs, wired once at startup.
pub struct AppDependencies {
    pub orders: Arc<dyn OrderRepository>,
    pub ledger: Arc<dyn TransactionLedger>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn NotificationDispatcher>,
    /// `None` rejects all webhook deliveries.
    pub webhook_verifier: Option<StripeWebhookVerifier>,
    pub currency: Currency,
}

/// Shared application state.
///
/// Cloned for each request; dependencies are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderRepository>,
    pub ledger: Arc<dyn TransactionLedger>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub webhook_verifier: Option<Arc<StripeWebhookVerifier>>,
    pub reconciler: Arc<PaymentReconciler>,
    pub currency: Currency,
}

impl AppState {
    pub fn new(deps: AppDependencies) -> Self {
        let reconciler = Arc::new(PaymentReconciler::new(
            deps.orders.clone(),
            deps.ledger.clone(),
            deps.notifier,
        ));
        Self {
            orders: deps.orders,
            ledger: deps.ledger,
            catalog: deps.catalog,
            webhook_events: deps.webhook_events,
            gateway: deps.gateway,
            webhook_verifier: deps.webhook_verifier.map(Arc::new),
            reconciler,
            currency: deps.currency,
        }
    }

    // Orders

    pub fn place_order_handler(&self) -> PlaceOrderHandler {
        PlaceOrderHandler::new(self.orders.clone(), self.catalog.clone(), self.currency.clone())
    }

    pub fn get_order_handler(&self) -> GetOrderHandler {
        GetOrderHandler::new(self.reconciler.clone())
    }

    pub fn update_order_status_handler(&self) -> UpdateOrderStatusHandler {
        UpdateOrderStatusHandler::new(self.orders.clone(), self.reconciler.clone())
    }

    // Payments

    pub fn create_payment_intent_handler(&self) -> CreatePaymentIntentHandler {
        CreatePaymentIntentHandler::new(
            self.gateway.clone(),
            self.orders.clone(),
            self.ledger.clone(),
            self.reconciler.clone(),
        )
    }

    pub fn confirm_payment_handler(&self) -> ConfirmPaymentHandler {
        ConfirmPaymentHandler::new(self.gateway.clone(), self.reconciler.clone())
    }

    pub fn payment_status_handler(&self) -> GetPaymentStatusHandler {
        GetPaymentStatusHandler::new(self.gateway.clone(), self.reconciler.clone())
    }

    pub fn refund_payment_handler(&self) -> RefundPaymentHandler {
        RefundPaymentHandler::new(self.gateway.clone(), self.reconciler.clone())
    }

    pub fn payment_availability_handler(&self) -> CheckPaymentAvailabilityHandler {
        CheckPaymentAvailabilityHandler::new(self.gateway.clone())
    }

    // Webhooks

    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            self.webhook_verifier.clone(),
            self.webhook_events.clone(),
            self.reconciler.clone(),
            self.gateway.clone(),
        )
    }
}
