//! Caller identification and path extractors.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use common::{OrderId, UserId};
use domain::Customer;
use secrecy::ExposeSecret;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated customer.
///
/// The user id is read from the header configured in
/// [`AuthSettings`](crate::state::AuthSettings) and must belong to a known
/// customer.
pub struct CurrentCustomer(pub Customer);

impl<R> FromRequestParts<Arc<AppState<R>>> for CurrentCustomer
where
    R: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<R>>,
    ) -> Result<Self, Self::Rejection> {
        let user_id: UserId = parts
            .headers
            .get(&state.auth.user_header)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .ok_or(ApiError::Forbidden)?;

        let customer = state
            .directory
            .find_customer(user_id)
            .await
            .ok_or_else(|| {
                tracing::debug!(%user_id, "unknown customer");
                ApiError::Forbidden
            })?;

        Ok(Self(customer))
    }
}

/// Proof that the caller presented the operator token.
pub struct OperatorAccess;

impl<R> FromRequestParts<Arc<AppState<R>>> for OperatorAccess
where
    R: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<R>>,
    ) -> Result<Self, Self::Rejection> {
        let expected = state
            .auth
            .operator_token
            .as_ref()
            .ok_or(ApiError::Forbidden)?;

        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(ApiError::Forbidden)?;

        if presented != expected.expose_secret() {
            tracing::warn!("operator request with wrong token");
            return Err(ApiError::Forbidden);
        }
        Ok(Self)
    }
}

/// Order id taken from a customer route's path.
///
/// An id that does not parse cannot name one of the customer's orders, so
/// it is handled like a missing order and redirects home.
#[derive(Debug)]
pub struct OrderIdParam(pub OrderId);

impl<S> FromRequestParts<S> for OrderIdParam
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(order_id) = Path::<OrderId>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(error = %rejection, "malformed order id");
                ApiError::redirect("/")
            })?;
        Ok(Self(order_id))
    }
}
