//! # Buy Crypto Handlers
//!
//! HTTP endpoints for comparing provider offers and checking one out.
//!
//! ## Endpoints
//!
//! - `POST /api/buy-crypto/offers` - Aggregate offers for a purchase
//! - `GET /api/buy-crypto/offers/{session_id}` - Current offers of a session
//! - `POST /api/buy-crypto/offers/{session_id}/{provider}/expand` - Toggle offer details
//! - `POST /api/buy-crypto/offers/{session_id}/{provider}/checkout` - Start checkout
//! - `POST /api/buy-crypto/offers/{session_id}/checkout/confirm` - Confirm and get the payment URL
//! - `POST /api/buy-crypto/offers/{session_id}/checkout/cancel` - Back to offer selection
//!
//! ## Request Example
//!
//! ```bash
//! curl -X POST http://localhost:3001/api/buy-crypto/offers \
//!   -H "Content-Type: application/json" \
//!   -d '{
//!     "amount": 100,
//!     "fiatCurrency": "USD",
//!     "coin": "btc",
//!     "country": "US",
//!     "paymentMethod": "debitCard",
//!     "wallet": {"id": "9f1c...", "coin": "btc", "network": "livenet"}
//!   }'
//! ```

use axum::{
    extract::{Path, State},
    Json,
};
use lib_core::{AppError, PaymentMethod, ProviderKey};
use lib_exchange::{OfferRequest, WalletRef};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::server::AppState;
use crate::services::{follow_feed, CheckoutState, Interstitial, Offer, OfferSession};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OffersRequestBody {
    pub amount: f64,
    pub fiat_currency: String,
    pub coin: String,
    pub country: String,
    pub payment_method: PaymentMethod,
    pub wallet: WalletRef,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OffersResponse {
    pub session_id: Uuid,
    pub request: OfferRequest,
    /// Visible offers in display order
    pub offers: Vec<Offer>,
    /// Every visible offer has its final outcome
    pub settled: bool,
    pub checkout: CheckoutState,
}

impl OffersResponse {
    fn from_session(session_id: Uuid, session: &OfferSession) -> Self {
        Self {
            session_id,
            request: session.request.clone(),
            offers: session.board.sorted().into_iter().cloned().collect(),
            settled: session.board.is_settled(),
            checkout: session.checkout.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandResponse {
    pub provider: ProviderKey,
    pub expanded: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmResponse {
    pub url: String,
}

fn parse_provider(provider: &str) -> Result<ProviderKey, AppError> {
    provider.parse().map_err(AppError::InvalidInput)
}

/// Aggregate offers from every provider able to serve the purchase.
///
/// **Route**: `POST /api/buy-crypto/offers`
///
/// Returns at once with the offers still loading. Each provider's outcome is
/// applied to the session as it arrives; poll
/// `GET /api/buy-crypto/offers/{session_id}` until `settled` is true.
#[instrument(skip(state, body), fields(amount = body.amount, coin = %body.coin))]
pub async fn create_offers(
    State(state): State<AppState>,
    Json(body): Json<OffersRequestBody>,
) -> Result<Json<OffersResponse>, AppError> {
    let request = OfferRequest::new(
        body.amount,
        &body.fiat_currency,
        &body.coin,
        &body.country,
        body.payment_method,
        body.wallet,
    )?;

    let feed = state.aggregator.start(request.clone());
    let session = OfferSession::new(request, feed.board().clone());
    let response_session = OffersResponse::from_session(Uuid::nil(), &session);
    let session_id = state.sessions.insert(session).await;
    tokio::spawn(follow_feed(feed, state.sessions.get(session_id).await?));

    info!(session_id = %session_id, offers = response_session.offers.len(), "Offer session started");
    Ok(Json(OffersResponse { session_id, ..response_session }))
}

/// **Route**: `GET /api/buy-crypto/offers/{session_id}`
pub async fn get_offers(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<OffersResponse>, AppError> {
    let shared = state.sessions.get(session_id).await?;
    let session = shared.lock().await;
    Ok(Json(OffersResponse::from_session(session_id, &session)))
}

/// **Route**: `POST /api/buy-crypto/offers/{session_id}/{provider}/expand`
pub async fn toggle_expanded(
    State(state): State<AppState>,
    Path((session_id, provider)): Path<(Uuid, String)>,
) -> Result<Json<ExpandResponse>, AppError> {
    let provider = parse_provider(&provider)?;
    let shared = state.sessions.get(session_id).await?;
    let mut session = shared.lock().await;

    let expanded = session.board.toggle_expanded(provider)?;
    Ok(Json(ExpandResponse { provider, expanded }))
}

/// Select an offer: creates the receiving address and returns the
/// confirmation prompt.
///
/// **Route**: `POST /api/buy-crypto/offers/{session_id}/{provider}/checkout`
#[instrument(skip(state))]
pub async fn begin_checkout(
    State(state): State<AppState>,
    Path((session_id, provider)): Path<(Uuid, String)>,
) -> Result<Json<Interstitial>, AppError> {
    let provider = parse_provider(&provider)?;
    let shared = state.sessions.get(session_id).await?;
    let mut guard = shared.lock().await;
    let session = &mut *guard;

    session.checkout.acknowledge();
    let offer = session
        .board
        .offer(provider)
        .filter(|o| o.visible)
        .ok_or_else(|| AppError::NotFound(format!("No {} offer in this session", provider)))?;

    let result = state.checkout.begin(&mut session.checkout, offer, &session.request).await;
    if result.is_err() {
        session.checkout.acknowledge();
    }
    result.map(Json)
}

/// Confirm the interstitial: creates the provider order, records the pending
/// payment, and returns the payment page URL.
///
/// **Route**: `POST /api/buy-crypto/offers/{session_id}/checkout/confirm`
#[instrument(skip(state))]
pub async fn confirm_checkout(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ConfirmResponse>, AppError> {
    let shared = state.sessions.get(session_id).await?;
    let mut guard = shared.lock().await;
    let session = &mut *guard;

    let CheckoutState::AwaitingConfirmation { provider, .. } = session.checkout else {
        return Err(AppError::Conflict("No checkout awaiting confirmation".to_string()));
    };
    let exchange = state
        .aggregator
        .provider(provider)
        .ok_or_else(|| AppError::Internal(format!("No integration registered for {}", provider)))?;
    let offer = session
        .board
        .offer(provider)
        .ok_or_else(|| AppError::NotFound(format!("No {} offer in this session", provider)))?;

    let result = state
        .checkout
        .confirm(&mut session.checkout, exchange.as_ref(), offer, &session.request)
        .await;
    if result.is_err() {
        session.checkout.acknowledge();
    }
    result.map(|url| Json(ConfirmResponse { url }))
}

/// **Route**: `POST /api/buy-crypto/offers/{session_id}/checkout/cancel`
pub async fn cancel_checkout(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CheckoutState>, AppError> {
    let shared = state.sessions.get(session_id).await?;
    let mut session = shared.lock().await;

    session.checkout.cancel()?;
    Ok(Json(session.checkout.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::create_router;
    use crate::server::tests::{state_with, test_state, FixedAddress, TestDeps};
    use crate::services::offers::tests::StaticProvider;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use lib_core::{Environment, PaymentStore, WalletNetwork};
    use lib_exchange::{AddressSource, ExchangeError, ExchangeProvider};
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Fails the first address request, then hands out an address.
    struct AddressFailsOnce(AtomicBool);

    #[async_trait]
    impl AddressSource for AddressFailsOnce {
        async fn create_address(&self, _wallet: &WalletRef) -> Result<String, ExchangeError> {
            if self.0.swap(true, Ordering::SeqCst) {
                Ok("1BoatSLRHtKNngkdXEeobR76b53LETtpyT".to_string())
            } else {
                Err(ExchangeError::Address("Wallet is locked".to_string()))
            }
        }
    }

    fn offers_body(amount: f64) -> OffersRequestBody {
        OffersRequestBody {
            amount,
            fiat_currency: "usd".to_string(),
            coin: "btc".to_string(),
            country: "us".to_string(),
            payment_method: PaymentMethod::DebitCard,
            wallet: WalletRef {
                id: "wallet-1".to_string(),
                coin: "btc".to_string(),
                network: WalletNetwork::Livenet,
                created_on: None,
            },
        }
    }

    async fn post(app: axum::Router, uri: &str, body: Option<String>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn start_session(app: axum::Router, amount: f64) -> Value {
        let (status, json) = post(app, "/api/buy-crypto/offers", Some(serde_json::to_string(&offers_body(amount)).unwrap())).await;
        assert_eq!(status, StatusCode::OK);
        json
    }

    /// Poll the session until `done` holds for it.
    async fn poll_until(app: axum::Router, session_id: &str, done: impl Fn(&Value) -> bool) -> Value {
        for _ in 0..100 {
            let (status, json) = get(app.clone(), &format!("/api/buy-crypto/offers/{}", session_id)).await;
            assert_eq!(status, StatusCode::OK);
            if done(&json) {
                return json;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("offer session {} never reached the expected state", session_id);
    }

    /// Start a session and wait until every offer is settled.
    async fn create_session(app: axum::Router, amount: f64) -> Value {
        let json = start_session(app.clone(), amount).await;
        let session_id = json["sessionId"].as_str().unwrap().to_string();
        poll_until(app, &session_id, |json| json["settled"] == true).await
    }

    #[tokio::test]
    async fn test_create_offers_sorted_by_crypto_amount() {
        let (state, _deps) = test_state(0.002, 0.0021).await;
        let app = create_router(state, vec![]);

        let json = create_session(app, 100.0).await;

        let offers = json["offers"].as_array().unwrap();
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0]["provider"], "wyre");
        assert_eq!(offers[0]["status"]["state"], "quoted");
        assert_eq!(offers[0]["status"]["detail"]["cryptoAmount"], 0.0021);
        assert_eq!(offers[1]["provider"], "simplex");
        assert_eq!(json["checkout"]["state"], "idle");
    }

    #[tokio::test]
    async fn test_offers_show_while_other_provider_loads() {
        let providers: Vec<Arc<dyn ExchangeProvider>> = vec![
            Arc::new(StaticProvider::quoting(ProviderKey::Simplex, 0.002)),
            Arc::new(StaticProvider {
                delay: Duration::from_millis(500),
                ..StaticProvider::quoting(ProviderKey::Wyre, 0.0021)
            }),
        ];
        let (state, _deps) = state_with(providers, Arc::new(FixedAddress)).await;
        let app = create_router(state, vec![]);

        let json = start_session(app.clone(), 100.0).await;
        assert_eq!(json["settled"], false);
        assert!(json["offers"].as_array().unwrap().iter().all(|o| o["status"]["state"] == "loading"));
        let session_id = json["sessionId"].as_str().unwrap().to_string();

        let partial = poll_until(app.clone(), &session_id, |json| json["offers"][0]["status"]["state"] == "quoted").await;
        assert_eq!(partial["settled"], false);
        assert_eq!(partial["offers"][0]["provider"], "simplex");
        assert_eq!(partial["offers"][1]["provider"], "wyre");
        assert_eq!(partial["offers"][1]["status"]["state"], "loading");

        let settled = poll_until(app, &session_id, |json| json["settled"] == true).await;
        assert_eq!(settled["offers"][0]["provider"], "wyre");
    }

    #[tokio::test]
    async fn test_failed_checkout_returns_to_offer_selection() {
        let providers: Vec<Arc<dyn ExchangeProvider>> = vec![
            Arc::new(StaticProvider::quoting(ProviderKey::Simplex, 0.002)),
            Arc::new(StaticProvider::quoting(ProviderKey::Wyre, 0.0021)),
        ];
        let (state, TestDeps { store }) =
            state_with(providers, Arc::new(AddressFailsOnce(AtomicBool::new(false)))).await;
        let app = create_router(state, vec![]);
        let json = create_session(app.clone(), 100.0).await;
        let session_id = json["sessionId"].as_str().unwrap();
        let checkout_uri = format!("/api/buy-crypto/offers/{}/wyre/checkout", session_id);

        let (status, error) = post(app.clone(), &checkout_uri, None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(error["error"], "Wallet is locked");

        let (_, json) = get(app.clone(), &format!("/api/buy-crypto/offers/{}", session_id)).await;
        assert_eq!(json["checkout"]["state"], "idle");
        assert!(store.list(Environment::Dev).await.unwrap().is_empty());

        let (status, interstitial) = post(app, &checkout_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(interstitial["title"], "Continue to Wyre");
    }

    #[tokio::test]
    async fn test_create_offers_rejects_invalid_amount() {
        let (state, _deps) = test_state(0.002, 0.0021).await;
        let app = create_router(state, vec![]);

        let (status, json) = post(app, "/api/buy-crypto/offers", Some(serde_json::to_string(&offers_body(-5.0)).unwrap())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_out_of_limit_offer_cannot_be_expanded() {
        let (state, _deps) = test_state(0.06, 0.06).await;
        let app = create_router(state, vec![]);
        let json = create_session(app.clone(), 3_000.0).await;
        let session_id = json["sessionId"].as_str().unwrap();

        assert_eq!(json["offers"][1]["status"]["state"], "outOfLimits");

        let (status, _) = post(app.clone(), &format!("/api/buy-crypto/offers/{}/wyre/expand", session_id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = post(app, &format!("/api/buy-crypto/offers/{}/simplex/expand", session_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["expanded"], true);
    }

    #[tokio::test]
    async fn test_checkout_flow_records_payment() {
        let (state, TestDeps { store }) = test_state(0.002, 0.0021).await;
        let app = create_router(state, vec![]);
        let json = create_session(app.clone(), 100.0).await;
        let session_id = json["sessionId"].as_str().unwrap();

        let (status, interstitial) =
            post(app.clone(), &format!("/api/buy-crypto/offers/{}/wyre/checkout", session_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(interstitial["title"], "Continue to Wyre");

        let (status, confirmed) =
            post(app.clone(), &format!("/api/buy-crypto/offers/{}/checkout/confirm", session_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(confirmed["url"], "https://wyre.example/pay");

        let payments = store.list(Environment::Dev).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].provider, ProviderKey::Wyre);
    }

    #[tokio::test]
    async fn test_cancel_without_checkout_conflicts() {
        let (state, _deps) = test_state(0.002, 0.0021).await;
        let app = create_router(state, vec![]);
        let json = create_session(app.clone(), 100.0).await;
        let session_id = json["sessionId"].as_str().unwrap();

        let (status, _) = post(app.clone(), &format!("/api/buy-crypto/offers/{}/checkout/cancel", session_id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        post(app.clone(), &format!("/api/buy-crypto/offers/{}/simplex/checkout", session_id), None).await;
        let (status, json) = post(app, &format!("/api/buy-crypto/offers/{}/checkout/cancel", session_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["state"], "idle");
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let (state, _deps) = test_state(0.002, 0.0021).await;
        let app = create_router(state, vec![]);

        let request = Request::builder()
            .uri(format!("/api/buy-crypto/offers/{}", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
