//! HTTP handlers for payment endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::dto::{
    ConfirmPaymentRequest, ConfirmPaymentResponse, CreatePaymentIntentRequest,
    CreatePaymentIntentResponse, PaymentAvailabilityResponse, PaymentStatusResponse,
    RefundPaymentRequest, RefundPaymentResponse,
};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::orders::handlers::parse_order_id;
use crate::adapters::http::state::AppState;
use crate::application::handlers::{
    ConfirmPaymentCommand, CreatePaymentIntentCommand, GetPaymentStatusQuery,
    RefundPaymentCommand,
};

/// POST /api/payments/intent - Create a payment intent
pub async fn create_payment_intent(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreatePaymentIntentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CreatePaymentIntentCommand {
        user,
        order_id: parse_order_id(request.order_id)?,
        amount: request.amount,
        description: request.description,
    };

    let result = state.create_payment_intent_handler().handle(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePaymentIntentResponse::from(result)),
    ))
}

/// POST /api/payments/confirm - Confirm an intent
///
/// A declined card is a 200 with `success: false`.
pub async fn confirm_payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = ConfirmPaymentCommand {
        user,
        payment_intent_id: request.payment_intent_id,
        order_id: parse_order_id(request.order_id)?,
        payment_method_id: request.payment_method_id,
    };

    let result = state.confirm_payment_handler().handle(cmd).await?;

    Ok(Json(ConfirmPaymentResponse::from(result)))
}

/// GET /api/payments/status/:intent_id - Intent status
pub async fn get_payment_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(intent_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let query = GetPaymentStatusQuery {
        user,
        payment_intent_id: intent_id,
    };

    let view = state.payment_status_handler().handle(query).await?;

    Ok(Json(PaymentStatusResponse::from(view)))
}

/// POST /api/payments/refund - Refund a settled payment
pub async fn refund_payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<RefundPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = RefundPaymentCommand {
        user,
        payment_intent_id: request.payment_intent_id,
        order_id: parse_order_id(request.order_id)?,
        amount: request.amount,
    };

    let result = state.refund_payment_handler().handle(cmd).await?;

    Ok(Json(RefundPaymentResponse::from(result)))
}

/// GET /api/payments/available - Gateway availability (no auth)
pub async fn check_payment_availability(State(state): State<AppState>) -> impl IntoResponse {
    let result = state.payment_availability_handler().handle().await;
    Json(PaymentAvailabilityResponse::from(result))
}
