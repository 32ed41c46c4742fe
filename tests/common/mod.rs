//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use creamery::adapters::http::{api_router, AppDependencies, AppState};
use creamery::adapters::memory::{
    InMemoryOrderRepository, InMemoryProductCatalog, InMemoryTransactionLedger,
    InMemoryWebhookEventRepository, RecordingNotificationDispatcher,
};
use creamery::adapters::stripe::MockPaymentGateway;
use creamery::application::handlers::{
    ConfirmPaymentCommand, CreatePaymentIntentCommand, HandlePaymentWebhookCommand,
    HandlePaymentWebhookResult, OrderLine, PlaceOrderCommand,
};
use creamery::domain::foundation::{AuthenticatedUser, Currency, OrderId, Role, UserId};
use creamery::domain::order::Order;
use creamery::domain::webhook::{sign_payload, StripeWebhookVerifier, WebhookError};

pub const WEBHOOK_SECRET: &str = "whsec_integration_secret";

pub const VANILLA: i64 = 1;
pub const PISTACHIO: i64 = 2;
pub const SORBET_OUT_OF_STOCK: i64 = 3;

pub struct Harness {
    pub orders: Arc<InMemoryOrderRepository>,
    pub ledger: Arc<InMemoryTransactionLedger>,
    pub catalog: Arc<InMemoryProductCatalog>,
    pub webhook_events: Arc<InMemoryWebhookEventRepository>,
    pub gateway: MockPaymentGateway,
    pub notifier: Arc<RecordingNotificationDispatcher>,
    pub state: AppState,
}

impl Harness {
    pub async fn new() -> Self {
        Self::build(true).await
    }

    pub async fn without_webhook_secret() -> Self {
        Self::build(false).await
    }

    async fn build(with_secret: bool) -> Self {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let catalog = Arc::new(InMemoryProductCatalog::new());
        let webhook_events = Arc::new(InMemoryWebhookEventRepository::new());
        let gateway = MockPaymentGateway::new();
        let notifier = Arc::new(RecordingNotificationDispatcher::new());

        catalog.add(VANILLA, "Vanilla Bean Pint", 899, true).await.unwrap();
        catalog.add(PISTACHIO, "Sicilian Pistachio Pint", 1099, true).await.unwrap();
        catalog
            .add(SORBET_OUT_OF_STOCK, "Blood Orange Sorbet", 799, false)
            .await
            .unwrap();

        let state = AppState::new(AppDependencies {
            orders: orders.clone(),
            ledger: ledger.clone(),
            catalog: catalog.clone(),
            webhook_events: webhook_events.clone(),
            gateway: Arc::new(gateway.clone()),
            notifier: notifier.clone(),
            webhook_verifier: with_secret
                .then(|| StripeWebhookVerifier::new(SecretString::new(WEBHOOK_SECRET.to_string()))),
            currency: Currency::usd(),
        });

        Self {
            orders,
            ledger,
            catalog,
            webhook_events,
            gateway,
            notifier,
            state,
        }
    }

    pub fn router(&self) -> Router {
        api_router(self.state.clone())
    }

    pub async fn order(&self, id: OrderId) -> Order {
        self.orders.get(id).await.expect("order exists")
    }

    /// Places an order of one vanilla pint (899) plus 300 shipping.
    pub async fn place_order(&self, user: &str) -> Order {
        self.state
            .place_order_handler()
            .handle(PlaceOrderCommand {
                user: customer(user),
                items: vec![OrderLine {
                    product_id: VANILLA,
                    quantity: 1,
                }],
                shipping_cost: 300,
                delivery_address_id: Some(12),
                notes: None,
            })
            .await
            .expect("order placed")
            .order
    }

    /// Creates an intent for the whole order and returns its id.
    pub async fn create_intent(&self, user: &str, order: &Order) -> String {
        self.state
            .create_payment_intent_handler()
            .handle(CreatePaymentIntentCommand {
                user: customer(user),
                order_id: order.id,
                amount: order.total_amount.minor_units(),
                description: None,
            })
            .await
            .expect("intent created")
            .payment_intent_id
    }

    pub async fn confirm(&self, user: &str, order: &Order, intent_id: &str) -> bool {
        self.state
            .confirm_payment_handler()
            .handle(ConfirmPaymentCommand {
                user: customer(user),
                payment_intent_id: intent_id.to_string(),
                order_id: order.id,
                payment_method_id: Some("pm_card_visa".to_string()),
            })
            .await
            .expect("confirm handled")
            .success
    }

    /// Delivers a correctly signed event straight to the webhook handler.
    pub async fn deliver(&self, event: &Value) -> Result<HandlePaymentWebhookResult, WebhookError> {
        let payload = event.to_string();
        self.state
            .webhook_handler()
            .handle(HandlePaymentWebhookCommand {
                signature: sign_now(&payload),
                payload: payload.into_bytes(),
            })
            .await
    }
}

pub fn customer(id: &str) -> AuthenticatedUser {
    AuthenticatedUser::customer(UserId::new(id).unwrap())
}

pub fn admin(id: &str) -> AuthenticatedUser {
    AuthenticatedUser::new(UserId::new(id).unwrap(), None, Role::Admin)
}

pub fn sign_now(payload: &str) -> String {
    sign_payload(WEBHOOK_SECRET, chrono::Utc::now().timestamp(), payload)
}

// ════════════════════════════════════════════════════════════════════════════
// Event fixtures
// ════════════════════════════════════════════════════════════════════════════

pub fn event(id: &str, event_type: &str, object: Value) -> Value {
    json!({
        "id": id,
        "object": "event",
        "type": event_type,
        "created": chrono::Utc::now().timestamp(),
        "livemode": false,
        "api_version": "2024-06-20",
        "data": { "object": object }
    })
}

pub fn intent_object(intent_id: &str, status: &str, order: Option<&Order>, charge: Option<&str>) -> Value {
    let metadata = match order {
        Some(order) => json!({ "order_id": order.id.value().to_string() }),
        None => json!({}),
    };
    json!({
        "id": intent_id,
        "object": "payment_intent",
        "status": status,
        "amount": order.map(|o| o.total_amount.minor_units()).unwrap_or(0),
        "currency": "usd",
        "metadata": metadata,
        "latest_charge": charge,
        "payment_method_types": ["card"]
    })
}

pub fn succeeded(event_id: &str, intent_id: &str, order: &Order, charge: &str) -> Value {
    event(
        event_id,
        "payment_intent.succeeded",
        intent_object(intent_id, "succeeded", Some(order), Some(charge)),
    )
}

pub fn payment_failed(event_id: &str, intent_id: &str, order: &Order) -> Value {
    let mut object = intent_object(intent_id, "requires_payment_method", Some(order), None);
    object["last_payment_error"] = json!({
        "code": "card_declined",
        "message": "Your card was declined."
    });
    event(event_id, "payment_intent.payment_failed", object)
}

pub fn charge_refunded(event_id: &str, charge_id: &str, intent_id: &str, amount: i64) -> Value {
    event(
        event_id,
        "charge.refunded",
        json!({
            "id": charge_id,
            "object": "charge",
            "payment_intent": intent_id,
            "amount": amount,
            "amount_refunded": amount,
            "refunded": true,
            "metadata": {}
        }),
    )
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP helpers
// ════════════════════════════════════════════════════════════════════════════

pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn json_request(method: &str, uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn webhook_request(payload: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/webhooks/stripe")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}
