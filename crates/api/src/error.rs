//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use checkout::CheckoutError;
use domain::{CartError, RepositoryError};

/// Page a customer without an address is sent to.
pub const ADDRESS_FORM_PATH: &str = "/account/addresses/new";

/// Delivery step of the checkout.
pub const DELIVERY_PATH: &str = "/order/delivery";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Recoverable precondition failure; the client is sent to `location`.
    Redirect(String),
    /// Caller is not allowed to use this route.
    Forbidden,
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Request conflicts with the current order state.
    Conflict(String),
    /// The payment gateway failed.
    BadGateway(String),
    /// Internal server error.
    Internal(String),
}

impl ApiError {
    pub fn redirect(location: impl Into<String>) -> Self {
        ApiError::Redirect(location.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Redirect(location) => return Redirect::to(&location).into_response(),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Access denied".to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        if err.is_invalid_transition() {
            return ApiError::Conflict(err.to_string());
        }
        match err {
            CheckoutError::NoSavedAddress => ApiError::redirect(ADDRESS_FORM_PATH),
            CheckoutError::InvalidAddress(_) | CheckoutError::UnknownCarrier(_) => {
                ApiError::redirect(DELIVERY_PATH)
            }
            CheckoutError::EmptyCart => ApiError::redirect("/cart"),
            // Wrong owner and missing order look the same
            CheckoutError::OrderNotFound(_) | CheckoutError::PaymentSessionNotFound(_) => {
                ApiError::redirect("/")
            }
            CheckoutError::OrderNotPayable { order_id, .. } => {
                ApiError::redirect(format!("/account/orders/{order_id}"))
            }
            CheckoutError::StateChanged(_) => ApiError::Conflict(err.to_string()),
            CheckoutError::Gateway(_) => ApiError::BadGateway(err.to_string()),
            CheckoutError::Domain(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
