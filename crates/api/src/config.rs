//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use checkout::{CheckoutUrls, HttpGatewayConfig};
use secrecy::SecretString;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `PUBLIC_BASE_URL`: base of success, cancel and image URLs (default: `"http://localhost:3000"`)
/// - `DATABASE_URL`: PostgreSQL store when set, in-memory store otherwise
/// - `PAYMENT_GATEWAY_URL`: HTTP gateway when set, in-memory gateway otherwise
/// - `PAYMENT_GATEWAY_SECRET`: bearer secret for the gateway
/// - `AUTH_USER_HEADER`: header carrying the authenticated user id (default: `"x-authenticated-user"`)
/// - `OPERATOR_TOKEN`: bearer token for `/admin`; admin is closed when unset
/// - `SEED_FILE`: JSON file with products, customers and carriers
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub public_base_url: String,
    pub database_url: Option<String>,
    pub gateway_url: Option<String>,
    pub gateway_secret: SecretString,
    pub auth_user_header: String,
    pub operator_token: Option<SecretString>,
    pub seed_file: Option<PathBuf>,
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            public_base_url: non_empty_var("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
            database_url: non_empty_var("DATABASE_URL"),
            gateway_url: non_empty_var("PAYMENT_GATEWAY_URL"),
            gateway_secret: SecretString::from(
                std::env::var("PAYMENT_GATEWAY_SECRET").unwrap_or_default(),
            ),
            auth_user_header: non_empty_var("AUTH_USER_HEADER")
                .unwrap_or(defaults.auth_user_header),
            operator_token: non_empty_var("OPERATOR_TOKEN").map(SecretString::from),
            seed_file: non_empty_var("SEED_FILE").map(PathBuf::from),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Session cookies are only sent over HTTPS when the shop is served over it.
    pub fn secure_cookies(&self) -> bool {
        self.public_base_url.starts_with("https://")
    }

    /// Public URLs handed to the payment gateway.
    pub fn checkout_urls(&self) -> CheckoutUrls {
        CheckoutUrls::new(&self.public_base_url)
    }

    /// HTTP gateway settings, if a gateway URL is configured.
    pub fn gateway_config(&self) -> Option<HttpGatewayConfig> {
        self.gateway_url
            .as_ref()
            .map(|url| HttpGatewayConfig::new(url, self.gateway_secret.clone()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            database_url: None,
            gateway_url: None,
            gateway_secret: SecretString::from(String::new()),
            auth_user_header: "x-authenticated-user".to_string(),
            operator_token: None,
            seed_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.public_base_url, "http://localhost:3000");
        assert_eq!(config.auth_user_header, "x-authenticated-user");
        assert!(config.database_url.is_none());
        assert!(config.operator_token.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_addr_default() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_gateway_config_only_when_url_set() {
        let mut config = Config::default();
        assert!(config.gateway_config().is_none());

        config.gateway_url = Some("https://pay.example".to_string());
        config.gateway_secret = SecretString::from("sk_test".to_string());
        let gateway = config.gateway_config().unwrap();
        assert_eq!(gateway.base_url, "https://pay.example");
        assert_eq!(gateway.secret.expose_secret(), "sk_test");
    }

    #[test]
    fn test_checkout_urls_follow_public_base() {
        let config = Config {
            public_base_url: "https://shop.example".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.checkout_urls().cancel_url(),
            "https://shop.example/cart/cancelled"
        );
    }

    #[test]
    fn test_secure_cookies_follow_scheme() {
        assert!(!Config::default().secure_cookies());

        let config = Config {
            public_base_url: "https://shop.example".to_string(),
            ..Config::default()
        };
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let config = Config {
            gateway_secret: SecretString::from("sk_live_very_secret".to_string()),
            ..Config::default()
        };
        assert!(!format!("{config:?}").contains("sk_live_very_secret"));
    }
}
