//! HTTP storefront checkout server with observability.
//!
//! Serves the session cart, the checkout flow up to the payment gateway,
//! the customer's order pages and the operator state changes, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod seed;
pub mod session;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::{HttpPaymentGateway, InMemoryPaymentGateway, PaymentGateway, TracingNotifier};
use domain::{Catalog, CustomerDirectory, OrderRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;

use config::Config;
use state::{AppState, AuthSettings, SetupError};

pub use session::{SESSION_COOKIE_NAME, create_session_layer};

/// Creates the Axum application router with all routes and shared state.
///
/// The session layer decides where carts live; see
/// [`create_session_layer`].
pub fn create_app<R, Store>(
    state: Arc<AppState<R>>,
    metrics_handle: PrometheusHandle,
    session_layer: SessionManagerLayer<Store>,
) -> Router
where
    R: OrderRepository + Clone + 'static,
    Store: tower_sessions::SessionStore + Clone,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/cart", get(routes::cart::show))
        .route("/cart/cancelled", get(routes::cart::cancelled))
        .route("/cart/add/{product_id}", post(routes::cart::add::<R>))
        .route("/cart/decrease/{product_id}", post(routes::cart::decrease))
        .route("/cart/remove", post(routes::cart::remove))
        .route("/order/delivery", get(routes::orders::delivery::<R>))
        .route(
            "/order/summary",
            get(routes::orders::summary_redirect).post(routes::orders::summary::<R>),
        )
        .route("/order/{id}/pay", post(routes::orders::pay::<R>))
        .route("/order/thanks/{session_id}", get(routes::orders::thanks::<R>))
        .route("/account/orders", get(routes::account::orders::<R>))
        .route("/account/orders/{id}", get(routes::account::order::<R>))
        .route("/admin/orders/{id}", get(routes::admin::order::<R>))
        .route("/admin/orders/{id}/state", post(routes::admin::transition::<R>))
        .with_state(state)
        .merge(metrics_router)
        .layer(session_layer)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state from configuration.
///
/// Uses the HTTP payment gateway when one is configured and the in-memory
/// gateway otherwise. Notifications go to the log.
pub fn create_default_state<R: OrderRepository + Clone + 'static>(
    config: &Config,
    orders: R,
    catalog: Arc<dyn Catalog>,
    directory: Arc<dyn CustomerDirectory>,
) -> Result<Arc<AppState<R>>, SetupError> {
    let gateway: Arc<dyn PaymentGateway> = match config.gateway_config() {
        Some(gateway_config) => {
            tracing::info!(base_url = %gateway_config.base_url, "using HTTP payment gateway");
            Arc::new(HttpPaymentGateway::new(gateway_config)?)
        }
        None => {
            tracing::warn!("no payment gateway configured, payments succeed instantly");
            Arc::new(InMemoryPaymentGateway::new())
        }
    };

    let auth = AuthSettings::new(&config.auth_user_header, config.operator_token.clone())?;

    Ok(Arc::new(AppState::new(
        orders,
        catalog,
        directory,
        gateway,
        Arc::new(TracingNotifier),
        config.checkout_urls(),
        auth,
    )))
}
