//! # Pending Payment Handlers
//!
//! - `GET /api/buy-crypto/payments` - Pending payments of the running environment
//! - `PUT /api/buy-crypto/payments/{provider}/{order_id}/status` - Record a reported outcome
//! - `DELETE /api/buy-crypto/payments/{provider}/{order_id}` - Remove a payment

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use lib_core::model::store::{PaymentStatus, PendingPayment};
use lib_core::{AppError, ProviderKey};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::server::AppState;

#[derive(Debug, Deserialize, Serialize)]
pub struct StatusUpdateBody {
    pub status: PaymentStatus,
}

fn parse_provider(provider: &str) -> Result<ProviderKey, AppError> {
    provider.parse().map_err(AppError::InvalidInput)
}

/// **Route**: `GET /api/buy-crypto/payments`
pub async fn list_payments(State(state): State<AppState>) -> Result<Json<Vec<PendingPayment>>, AppError> {
    let payments = state.store.list(state.config.environment).await?;
    Ok(Json(payments))
}

/// **Route**: `PUT /api/buy-crypto/payments/{provider}/{order_id}/status`
#[instrument(skip(state, body), fields(status = %body.status))]
pub async fn update_payment_status(
    State(state): State<AppState>,
    Path((provider, order_id)): Path<(String, String)>,
    Json(body): Json<StatusUpdateBody>,
) -> Result<Json<PendingPayment>, AppError> {
    let provider = parse_provider(&provider)?;
    let env = state.config.environment;

    state.store.update_status(env, provider, &order_id, body.status).await?;
    let payment = state
        .store
        .find(env, provider, &order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", order_id)))?;

    Ok(Json(payment))
}

/// **Route**: `DELETE /api/buy-crypto/payments/{provider}/{order_id}`
#[instrument(skip(state))]
pub async fn remove_payment(
    State(state): State<AppState>,
    Path((provider, order_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let provider = parse_provider(&provider)?;

    if !state.store.remove(state.config.environment, provider, &order_id).await? {
        return Err(AppError::NotFound(format!("Payment {} not found", order_id)));
    }

    info!(provider = %provider, order_id = %order_id, "Pending payment removed");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::create_router;
    use crate::server::tests::{test_state, TestDeps};
    use axum::body::Body;
    use axum::http::Request;
    use lib_core::model::store::NewPendingPayment;
    use lib_core::{Environment, PaymentStore};
    use serde_json::Value;
    use tower::ServiceExt;

    fn payment(env: Environment, order_id: &str) -> NewPendingPayment {
        NewPendingPayment {
            env,
            provider: ProviderKey::Simplex,
            order_id: order_id.to_string(),
            payment_id: Some("p-1".to_string()),
            address: "1Boat".to_string(),
            coin: "BTC".to_string(),
            crypto_amount: 0.002,
            fiat_base_amount: 100.0,
            fiat_total_amount: 105.0,
            fiat_total_amount_currency: "USD".to_string(),
            user_id: "wallet-1".to_string(),
        }
    }

    async fn send(app: axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_environment() {
        let (state, TestDeps { store }) = test_state(0.002, 0.0021).await;
        store.insert(payment(Environment::Dev, "o-dev")).await.unwrap();
        store.insert(payment(Environment::Prod, "o-prod")).await.unwrap();
        let app = create_router(state, vec![]);

        let (status, json) = send(app, "GET", "/api/buy-crypto/payments", None).await;

        assert_eq!(status, StatusCode::OK);
        let payments = json.as_array().unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0]["orderId"], "o-dev");
        assert_eq!(payments[0]["status"], "paymentRequestSent");
    }

    #[tokio::test]
    async fn test_update_status() {
        let (state, TestDeps { store }) = test_state(0.002, 0.0021).await;
        store.insert(payment(Environment::Dev, "o-1")).await.unwrap();
        let app = create_router(state, vec![]);

        let (status, json) = send(
            app,
            "PUT",
            "/api/buy-crypto/payments/simplex/o-1/status",
            Some(serde_json::json!({"status": "success"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
    }

    #[tokio::test]
    async fn test_remove_payment() {
        let (state, TestDeps { store }) = test_state(0.002, 0.0021).await;
        store.insert(payment(Environment::Dev, "o-1")).await.unwrap();
        let app = create_router(state, vec![]);

        let (status, _) = send(app.clone(), "DELETE", "/api/buy-crypto/payments/simplex/o-1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(app.clone(), "DELETE", "/api/buy-crypto/payments/simplex/o-1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(app, "DELETE", "/api/buy-crypto/payments/coinbase/o-1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
