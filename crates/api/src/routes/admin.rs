//! Operator endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use checkout::CheckoutError;
use common::OrderId;
use domain::{OrderRepository, OrderState};
use serde::{Deserialize, Serialize};

use super::views::OrderView;
use crate::error::ApiError;
use crate::extract::OperatorAccess;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// Integer code of the target state.
    pub state: i16,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub order: OrderView,
    pub changed: bool,
    pub notified: bool,
}

/// A malformed id cannot name an existing order.
fn order_id_or_not_found(
    param: Result<Path<OrderId>, PathRejection>,
) -> Result<OrderId, ApiError> {
    param
        .map(|Path(order_id)| order_id)
        .map_err(|rejection| ApiError::NotFound(format!("Order not found: {}", rejection.body_text())))
}

/// GET /admin/orders/{id}: any order, by id.
pub async fn order<R: OrderRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    _operator: OperatorAccess,
    order_id: Result<Path<OrderId>, PathRejection>,
) -> Result<Json<OrderView>, ApiError> {
    let order_id = order_id_or_not_found(order_id)?;
    let order = state
        .orders
        .find(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {order_id} not found")))?;
    Ok(Json(OrderView::from(&order)))
}

/// POST /admin/orders/{id}/state: moves an order to another state.
#[tracing::instrument(skip(state, _operator, order_id, req))]
pub async fn transition<R: OrderRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    _operator: OperatorAccess,
    order_id: Result<Path<OrderId>, PathRejection>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let order_id = order_id_or_not_found(order_id)?;
    let target = OrderState::from_code(req.state)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown order state code: {}", req.state)))?;

    let outcome = state
        .state_machine
        .transition(order_id, target)
        .await
        .map_err(|e| match e {
            CheckoutError::OrderNotFound(id) => ApiError::NotFound(format!("Order {id} not found")),
            other => ApiError::from(other),
        })?;

    Ok(Json(TransitionResponse {
        order: OrderView::from(&outcome.order),
        changed: outcome.changed,
        notified: outcome.notified,
    }))
}
