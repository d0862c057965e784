//! Customer account pages.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{OrderRepository, OrderState};

use super::views::OrderView;
use crate::error::ApiError;
use crate::extract::{CurrentCustomer, OrderIdParam};
use crate::state::AppState;

/// GET /account/orders: the customer's orders in progress, newest first.
pub async fn orders<R: OrderRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    CurrentCustomer(customer): CurrentCustomer,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let orders = state
        .orders
        .list_for_user(customer.id, &OrderState::IN_PROGRESS)
        .await?;
    Ok(Json(orders.iter().map(OrderView::from).collect()))
}

/// GET /account/orders/{id}: one of the customer's orders.
///
/// Missing orders and orders of other customers both redirect home.
pub async fn order<R: OrderRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    CurrentCustomer(customer): CurrentCustomer,
    OrderIdParam(order_id): OrderIdParam,
) -> Result<Json<OrderView>, ApiError> {
    let order = state
        .orders
        .find_for_user(order_id, customer.id)
        .await?
        .ok_or_else(|| ApiError::redirect("/"))?;
    Ok(Json(OrderView::from(&order)))
}
