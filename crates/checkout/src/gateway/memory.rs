use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CheckoutSession, CheckoutSessionRequest, GatewayError, PaymentGateway};
use crate::payment::SESSION_ID_PLACEHOLDER;

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    requests: Vec<(String, CheckoutSessionRequest)>,
    next_id: u32,
    fail: bool,
}

/// In-memory payment gateway for tests and local runs.
///
/// Every session "pays" instantly: the redirect URL is the success URL
/// with the session id filled in.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<Mutex<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory payment gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail on every session request.
    pub async fn set_fail(&self, fail: bool) {
        self.state.lock().await.fail = fail;
    }

    /// Returns the number of sessions created.
    pub async fn session_count(&self) -> usize {
        self.state.lock().await.requests.len()
    }

    /// Returns the request that created a session, if any.
    pub async fn request_for(&self, session_id: &str) -> Option<CheckoutSessionRequest> {
        self.state
            .lock()
            .await
            .requests
            .iter()
            .find(|(id, _)| id == session_id)
            .map(|(_, request)| request.clone())
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let mut state = self.state.lock().await;

        if state.fail {
            return Err(GatewayError::Unavailable("Gateway offline".to_string()));
        }

        state.next_id += 1;
        let session_id = format!("cs_test_{:04}", state.next_id);
        let redirect_url = request
            .success_url
            .replace(SESSION_ID_PLACEHOLDER, &session_id);
        state.requests.push((session_id.clone(), request.clone()));

        Ok(CheckoutSession {
            session_id,
            redirect_url,
        })
    }
}
