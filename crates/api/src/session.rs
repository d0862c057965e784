//! Cookie sessions and the cart stored in them.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use domain::{CART_SESSION_KEY, Cart, CartStore, SessionError, SessionStore};
use tokio::task::JoinHandle;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{ExpiredDeletion, Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::error::ApiError;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "shop_session";

/// Sessions idle for longer than this are dropped (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// How often expired sessions are purged from PostgreSQL.
const EXPIRED_SESSION_SWEEP: std::time::Duration = std::time::Duration::from_secs(60);

/// Creates the session layer over any tower-sessions store.
///
/// Sessions expire after a week without activity. `secure` should be set
/// when the shop is served over HTTPS.
#[must_use]
pub fn create_session_layer<Store>(store: Store, secure: bool) -> SessionManagerLayer<Store>
where
    Store: tower_sessions::SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(SESSION_EXPIRY_SECONDS)))
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Creates the PostgreSQL session table if needed and starts purging
/// expired sessions in the background.
pub async fn start_postgres_sessions(
    store: &PostgresStore,
) -> Result<JoinHandle<()>, tower_sessions::session_store::Error> {
    store
        .migrate()
        .await
        .map_err(tower_sessions_sqlx_store::SqlxStoreError::Sqlx)?;

    let sweeper = store.clone();
    Ok(tokio::task::spawn(async move {
        if let Err(error) = sweeper.continuously_delete_expired(EXPIRED_SESSION_SWEEP).await {
            tracing::error!(%error, "expired session cleanup stopped");
        }
    }))
}

/// [`SessionStore`] backed by a tower-sessions [`Session`].
#[derive(Debug, Clone)]
pub struct SessionCartStorage(pub Session);

#[async_trait]
impl SessionStore for SessionCartStorage {
    async fn load_cart(&self) -> Result<Option<Cart>, SessionError> {
        self.0
            .get::<Cart>(CART_SESSION_KEY)
            .await
            .map_err(SessionError::new)
    }

    async fn store_cart(&self, cart: &Cart) -> Result<(), SessionError> {
        self.0
            .insert(CART_SESSION_KEY, cart)
            .await
            .map_err(SessionError::new)
    }

    async fn clear_cart(&self) -> Result<(), SessionError> {
        self.0
            .remove::<Cart>(CART_SESSION_KEY)
            .await
            .map(|_| ())
            .map_err(SessionError::new)
    }
}

/// Extractor for the cart of the current session.
pub struct SessionCart(pub CartStore<SessionCartStorage>);

impl<S> FromRequestParts<S> for SessionCart
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("session layer missing".to_string()))?;

        Ok(Self(CartStore::new(SessionCartStorage(session))))
    }
}
