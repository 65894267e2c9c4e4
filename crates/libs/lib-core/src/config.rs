//! # Application Configuration
//!
//! Configuration is loaded from environment variables (optionally from a `.env`
//! file) and validated on startup to fail fast if misconfigured. The resulting
//! [`Config`] is passed explicitly to the services that need it.

use crate::model::buy_crypto::Environment;
use lib_utils::envs::{get_env, get_env_or, get_env_parse, Error as EnvError};
use std::time::Duration;

const DEFAULT_EXCHANGE_API_URL: &str = "https://bws.bitpay.com/bws/api";

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite database connection URL
    pub database_url: String,

    /// Base URL of the wallet service proxy in front of the exchange providers
    pub exchange_api_url: String,

    /// Base URL of the wallet service used to derive receiving addresses
    pub wallet_service_url: String,

    /// Deep-link scheme providers redirect back to (e.g. `bitpay://wyre?...`)
    pub app_scheme: String,

    /// Deployment environment; scopes pending payments and selects provider sandboxes
    pub environment: Environment,

    /// Per-request timeout for provider calls, in seconds.
    ///
    /// Valid range: 1-120
    pub http_timeout_secs: u64,

    /// Open provider payment pages in the host's browser instead of leaving
    /// that to the HTTP client. For single-user desktop deployments.
    pub open_in_browser: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url = get_env_or("DATABASE_URL", "sqlite:data/buy_crypto.db");
        let exchange_api_url = get_env_or("EXCHANGE_API_URL", DEFAULT_EXCHANGE_API_URL);
        let wallet_service_url = get_env("WALLET_SERVICE_URL").unwrap_or_else(|_| exchange_api_url.clone());
        let app_scheme = get_env_or("APP_SCHEME", "bitpay");

        let environment = get_env_or("APP_ENV", "prod")
            .parse::<Environment>()?;

        let http_timeout_secs = match get_env_parse::<u64>("HTTP_TIMEOUT_SECS") {
            Ok(secs) => secs,
            Err(EnvError::MissingEnv(_)) => 10,
            Err(EnvError::WrongFormat(_)) => return Err("HTTP_TIMEOUT_SECS must be a valid number".to_string()),
        };

        let open_in_browser = match get_env_parse::<bool>("OPEN_PAYMENT_IN_BROWSER") {
            Ok(open) => open,
            Err(EnvError::MissingEnv(_)) => false,
            Err(EnvError::WrongFormat(_)) => return Err("OPEN_PAYMENT_IN_BROWSER must be true or false".to_string()),
        };

        Ok(Self {
            database_url,
            exchange_api_url: exchange_api_url.trim_end_matches('/').to_string(),
            wallet_service_url: wallet_service_url.trim_end_matches('/').to_string(),
            app_scheme,
            environment,
            http_timeout_secs,
            open_in_browser,
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        for (name, url) in [
            ("EXCHANGE_API_URL", &self.exchange_api_url),
            ("WALLET_SERVICE_URL", &self.wallet_service_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("{} must be an http(s) URL", name));
            }
        }

        if self.app_scheme.is_empty()
            || !self.app_scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        {
            return Err("APP_SCHEME must be a non-empty URL scheme".to_string());
        }

        if self.http_timeout_secs < 1 || self.http_timeout_secs > 120 {
            return Err("HTTP_TIMEOUT_SECS must be between 1 and 120".to_string());
        }

        Ok(())
    }

    /// Provider request timeout as a [`Duration`].
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
