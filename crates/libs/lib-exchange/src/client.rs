//! # Wallet Service HTTP Client
//!
//! HTTP client for the wallet service proxy that fronts every exchange provider.
//! Each request body carries a client-generated correlation `id`; a successful
//! response must echo it back.

use crate::error::ExchangeError;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_BASE_URL: &str = "https://bws.bitpay.com/bws/api";

/// Builder for configuring [`ExchangeHttpClient`].
#[derive(Debug, Clone)]
pub struct ExchangeClientBuilder {
    timeout: Option<Duration>,
    base_url: Option<String>,
}

impl Default for ExchangeClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            base_url: Some(DEFAULT_BASE_URL.to_string()),
        }
    }
}

impl ExchangeClientBuilder {
    /// Set the HTTP request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the wallet service base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn build(self) -> Result<ExchangeHttpClient, ExchangeError> {
        let http = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| ExchangeError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(ExchangeHttpClient { http, base_url })
    }
}

/// Raw reply of the proxy. Successful replies have passed the correlation check.
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ServiceResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[derive(Serialize)]
struct Correlated<'a, B: Serialize> {
    id: &'a str,
    #[serde(flatten)]
    body: &'a B,
}

/// HTTP client for the wallet service proxy.
#[derive(Debug, Clone)]
pub struct ExchangeHttpClient {
    http: Client,
    base_url: String,
}

impl ExchangeHttpClient {
    /// Create a client with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ExchangeError> {
        Self::builder().base_url(base_url).build()
    }

    pub fn builder() -> ExchangeClientBuilder {
        ExchangeClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `{base_url}{path}` with a fresh correlation id.
    pub async fn post_service<B: Serialize>(&self, path: &str, body: &B) -> Result<ServiceResponse, ExchangeError> {
        let id = new_correlation_id();
        self.post_correlated(path, &id, body).await
    }

    pub(crate) async fn post_correlated<B: Serialize>(
        &self,
        path: &str,
        id: &str,
        body: &B,
    ) -> Result<ServiceResponse, ExchangeError> {
        debug!(path = %path, correlation_id = %id, "Wallet service request");
        let response = self.send(path, &Correlated { id, body }).await?;

        if response.is_success() {
            verify_correlation(id, &response.body)?;
        }
        Ok(response)
    }

    /// POST `body` without a correlation envelope, for wallet endpoints that do not echo ids.
    pub async fn post_plain<B: Serialize>(&self, path: &str, body: &B) -> Result<ServiceResponse, ExchangeError> {
        debug!(path = %path, "Wallet service request");
        self.send(path, body).await
    }

    async fn send<B: Serialize>(&self, path: &str, body: &B) -> Result<ServiceResponse, ExchangeError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(format!("{} request failed: {}", path, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ExchangeError::Transport(format!("{} body read failed: {}", path, e)))?;

        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(ExchangeError::Transport(format!("{} returned HTTP {}: {}", path, status, text)));
            }
            Err(e) => {
                return Err(ExchangeError::Transport(format!("{} parse failed: {}", path, e)));
            }
        };

        if !status.is_success() {
            debug!(url = %url, status = %status, "Wallet service rejected request");
        }

        Ok(ServiceResponse { status, body })
    }
}

/// Generate a correlation id for one request.
pub fn new_correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Check that `body.id` echoes `expected`.
pub fn verify_correlation(expected: &str, body: &Value) -> Result<(), ExchangeError> {
    let received = match body.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    if received.as_deref() == Some(expected) {
        return Ok(());
    }

    warn!(expected = %expected, received = ?received, "The response does not match the origin of the request");
    Err(ExchangeError::CorrelationMismatch {
        expected: expected.to_string(),
        received,
    })
}
