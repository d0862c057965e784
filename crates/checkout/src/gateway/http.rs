use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::{CheckoutSession, CheckoutSessionRequest, GatewayError, PaymentGateway};

/// Connection settings of the hosted checkout provider.
#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    /// Base URL; sessions are created at `{base_url}/checkout/sessions`.
    pub base_url: String,
    /// Bearer secret sent with every request.
    pub secret: SecretString,
    pub timeout: Duration,
}

impl HttpGatewayConfig {
    pub fn new(base_url: impl Into<String>, secret: SecretString) -> Self {
        Self {
            base_url: base_url.into(),
            secret,
            timeout: Duration::from_secs(10),
        }
    }

    fn sessions_url(&self) -> String {
        format!("{}/checkout/sessions", self.base_url.trim_end_matches('/'))
    }
}

/// Payment gateway speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    config: HttpGatewayConfig,
}

impl HttpPaymentGateway {
    /// Creates a gateway client with the configured timeout.
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[tracing::instrument(skip(self, request), fields(line_items = request.line_items.len()))]
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let response = self
            .client
            .post(self.config.sessions_url())
            .bearer_auth(self.config.secret.expose_secret())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let session: CheckoutSession = serde_json::from_str(&body)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        if session.session_id.is_empty() || session.redirect_url.is_empty() {
            return Err(GatewayError::MalformedResponse(
                "empty session id or redirect url".to_string(),
            ));
        }

        Ok(session)
    }
}
