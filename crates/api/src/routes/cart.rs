//! Session cart endpoints. Anonymous visitors may use these.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::Redirect;
use common::ProductId;
use domain::OrderRepository;

use super::views::CartView;
use crate::error::ApiError;
use crate::session::SessionCart;
use crate::state::AppState;

/// Shown after the customer backed out of the payment page.
pub const PAYMENT_CANCELLED_NOTICE: &str = "payment cancelled, you can update your cart and order";

/// GET /cart: current cart with totals.
pub async fn show(SessionCart(cart): SessionCart) -> Result<Json<CartView>, ApiError> {
    let cart = cart.get_cart().await?;
    Ok(Json(CartView::new(&cart)))
}

/// GET /cart/cancelled: cart with a notice after an abandoned payment.
pub async fn cancelled(SessionCart(cart): SessionCart) -> Result<Json<CartView>, ApiError> {
    let cart = cart.get_cart().await?;
    Ok(Json(
        CartView::new(&cart).with_notice(PAYMENT_CANCELLED_NOTICE),
    ))
}

/// POST /cart/add/{product_id}: adds one unit of a catalog product.
#[tracing::instrument(skip(state, cart))]
pub async fn add<R: OrderRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    SessionCart(cart): SessionCart,
    Path(product_id): Path<String>,
) -> Result<Redirect, ApiError> {
    let product_id = ProductId::new(product_id);
    let Some(product) = state.catalog.find_product(&product_id).await else {
        tracing::debug!(%product_id, "unknown product");
        return Ok(Redirect::to("/"));
    };

    cart.add(product).await?;
    Ok(Redirect::to("/cart"))
}

/// POST /cart/decrease/{product_id}: removes one unit of a product.
#[tracing::instrument(skip(cart))]
pub async fn decrease(
    SessionCart(cart): SessionCart,
    Path(product_id): Path<String>,
) -> Result<Redirect, ApiError> {
    cart.decrease(&ProductId::new(product_id)).await?;
    Ok(Redirect::to("/cart"))
}

/// POST /cart/remove: empties the cart.
pub async fn remove(SessionCart(cart): SessionCart) -> Result<Redirect, ApiError> {
    cart.remove().await?;
    Ok(Redirect::to("/"))
}
