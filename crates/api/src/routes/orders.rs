//! Checkout flow endpoints: delivery choice, order summary, payment.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::{Form, Json};
use checkout::{DeliveryOptions, OrderForm};
use domain::OrderRepository;
use serde::Serialize;

use super::views::OrderView;
use crate::error::{ApiError, DELIVERY_PATH};
use crate::extract::{CurrentCustomer, OrderIdParam};
use crate::session::SessionCart;
use crate::state::AppState;

/// GET /order/delivery: addresses and carriers to choose from.
pub async fn delivery<R: OrderRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    CurrentCustomer(customer): CurrentCustomer,
) -> Result<Json<DeliveryOptions>, ApiError> {
    let options = state.builder.delivery_options(customer.id).await?;
    Ok(Json(options))
}

/// GET /order/summary: only reachable by submitting the delivery form.
pub async fn summary_redirect() -> Redirect {
    Redirect::to("/cart")
}

/// POST /order/summary: places the order and returns its recap.
///
/// A form that does not parse sends the customer back to the delivery step.
#[tracing::instrument(skip(state, customer, cart, form), fields(user_id = %customer.id))]
pub async fn summary<R: OrderRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    CurrentCustomer(customer): CurrentCustomer,
    SessionCart(cart): SessionCart,
    form: Result<Form<OrderForm>, FormRejection>,
) -> Result<Json<OrderView>, ApiError> {
    let Form(form) = form.map_err(|rejection| {
        tracing::debug!(error = %rejection, "invalid order form");
        ApiError::redirect(DELIVERY_PATH)
    })?;
    let cart = cart.get_cart().await?;
    let order = state.builder.place_order(&customer, &cart, &form).await?;
    Ok(Json(OrderView::from(&order)))
}

/// POST /order/{id}/pay: opens a gateway session and sends the customer there.
#[tracing::instrument(skip(state, customer), fields(user_id = %customer.id))]
pub async fn pay<R: OrderRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    CurrentCustomer(customer): CurrentCustomer,
    OrderIdParam(order_id): OrderIdParam,
) -> Result<Redirect, ApiError> {
    let session = state.payments.start_payment(order_id, &customer).await?;
    Ok(Redirect::to(&session.redirect_url))
}

#[derive(Debug, Serialize)]
pub struct ThanksResponse {
    pub order: OrderView,
    pub newly_paid: bool,
}

/// GET /order/thanks/{session_id}: return point after a successful payment.
#[tracing::instrument(skip(state, customer, cart), fields(user_id = %customer.id))]
pub async fn thanks<R: OrderRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    CurrentCustomer(customer): CurrentCustomer,
    SessionCart(cart): SessionCart,
    Path(session_id): Path<String>,
) -> Result<Json<ThanksResponse>, ApiError> {
    let confirmation = state
        .payments
        .confirm_payment(&session_id, customer.id, &cart)
        .await?;

    Ok(Json(ThanksResponse {
        order: OrderView::from(&confirmation.order),
        newly_paid: confirmation.newly_paid,
    }))
}
