//! HTTP handlers for order endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::dto::{OrderResponse, PlaceOrderRequest, UpdateOrderStatusRequest, UpdateOrderStatusResponse};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::AppState;
use crate::application::handlers::{
    GetOrderQuery, OrderLine, PlaceOrderCommand, UpdateOrderStatusCommand,
};
use crate::domain::foundation::OrderId;
use crate::domain::order::OrderError;

pub(crate) fn parse_order_id(raw: i64) -> Result<OrderId, ApiError> {
    OrderId::new(raw).map_err(|e| ApiError(OrderError::from(e)))
}

/// POST /api/orders - Place an order
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = PlaceOrderCommand {
        user,
        items: request.items.into_iter().map(OrderLine::from).collect(),
        shipping_cost: request.shipping_cost,
        delivery_address_id: request.delivery_address_id,
        notes: request.notes,
    };

    let result = state.place_order_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&result.order))))
}

/// GET /api/orders/:id - Get an order and its current payment attempt
pub async fn get_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let query = GetOrderQuery {
        user,
        order_id: parse_order_id(order_id)?,
    };

    let result = state.get_order_handler().handle(query).await?;

    let response = OrderResponse::from(&result.order).with_transaction(result.transaction.as_ref());
    Ok(Json(response))
}

/// PATCH /api/admin/orders/:id/status - Move an order along fulfillment
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<i64>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = UpdateOrderStatusCommand {
        user,
        order_id: parse_order_id(order_id)?,
        status: request.status,
    };

    let result = state.update_order_status_handler().handle(cmd).await?;

    Ok(Json(UpdateOrderStatusResponse {
        previous_status: result.previous_status,
        order: OrderResponse::from(&result.order),
    }))
}
