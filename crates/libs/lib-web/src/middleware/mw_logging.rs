//! # Request/Response Logging Middleware
//!
//! Structured logging for every HTTP request and response, tagged with the
//! request id from [`RequestStamp`]. Headers are logged at debug level with
//! credentials redacted.
//!
//! Wallet and order identifiers appear in buy-crypto paths, so for those
//! routes only the route prefix is logged at info level.

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::middleware::mw_req_stamp::RequestStamp;

/// Sensitive headers that should not be logged
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "x-api-key",
    "x-auth-token",
];

/// Routes whose trailing path segments carry order or session identifiers
const MASKED_PREFIXES: &[&str] = &[
    "/api/buy-crypto/payments",
    "/api/buy-crypto/offers",
];

/// Path as it should appear in info-level logs.
fn loggable_path(path: &str) -> String {
    match MASKED_PREFIXES.iter().find(|p| path.starts_with(*p)) {
        Some(prefix) if path.len() > prefix.len() => format!("{}/…", prefix),
        _ => path.to_string(),
    }
}

pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = loggable_path(req.uri().path());

    let request_id = req
        .extensions()
        .get::<RequestStamp>()
        .map(|s| s.id.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            if SENSITIVE_HEADERS.iter().any(|h| name_lower.contains(h)) {
                Some((name.to_string(), "***REDACTED***".to_string()))
            } else {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            }
        })
        .collect();

    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        user_agent = ?user_agent,
        "[REQUEST] {} {}",
        method,
        path
    );
    debug!(request_id = %request_id, headers = ?headers, "[REQUEST HEADERS]");

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();
    let status_code = status.as_u16();

    if status.is_success() {
        info!(
            request_id = %request_id,
            status = status_code,
            duration_ms = duration.as_millis(),
            "[RESPONSE] {} {} -> {} ({}ms)",
            method,
            path,
            status_code,
            duration.as_millis()
        );
    } else if status.is_client_error() {
        warn!(
            request_id = %request_id,
            status = status_code,
            duration_ms = duration.as_millis(),
            "[RESPONSE] {} {} -> {} ({}ms) [CLIENT ERROR]",
            method,
            path,
            status_code,
            duration.as_millis()
        );
    } else if status.is_server_error() {
        error!(
            request_id = %request_id,
            status = status_code,
            duration_ms = duration.as_millis(),
            "[RESPONSE] {} {} -> {} ({}ms) [SERVER ERROR]",
            method,
            path,
            status_code,
            duration.as_millis()
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loggable_path() {
        assert_eq!(loggable_path("/health"), "/health");
        assert_eq!(loggable_path("/api/buy-crypto/offers"), "/api/buy-crypto/offers");
        assert_eq!(
            loggable_path("/api/buy-crypto/payments/simplex/o-1"),
            "/api/buy-crypto/payments/…"
        );
    }
}
