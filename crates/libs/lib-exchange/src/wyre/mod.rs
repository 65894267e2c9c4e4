//! # Wyre
//!
//! Wallet order quotation and reservation for Wyre. Wyre quotes against a
//! concrete destination, so the receiving address is created before quoting.

pub mod quote;
pub mod reservation;
pub mod types;

use crate::client::ExchangeHttpClient;
use crate::error::ExchangeError;
use crate::provider::{CheckoutTicket, ExchangeProvider, ProviderQuote, ProviderQuoteResponse};
use crate::request::OfferRequest;
use crate::wallet::AddressSource;
use async_trait::async_trait;
use lib_core::{Environment, ProviderKey};
use std::sync::Arc;
use tracing::instrument;

#[derive(Clone)]
pub struct WyreProvider {
    client: Arc<ExchangeHttpClient>,
    addresses: Arc<dyn AddressSource>,
    env: Environment,
    app_scheme: String,
}

impl WyreProvider {
    pub fn new(
        client: Arc<ExchangeHttpClient>,
        addresses: Arc<dyn AddressSource>,
        env: Environment,
        app_scheme: impl Into<String>,
    ) -> Self {
        Self {
            client,
            addresses,
            env,
            app_scheme: app_scheme.into(),
        }
    }
}

#[async_trait]
impl ExchangeProvider for WyreProvider {
    fn key(&self) -> ProviderKey {
        ProviderKey::Wyre
    }

    #[instrument(skip_all, fields(coin = %request.coin, fiat = %request.fiat_currency))]
    async fn fetch_quote(&self, request: &OfferRequest) -> Result<ProviderQuote, ExchangeError> {
        quote::fetch(self, request).await
    }

    #[instrument(skip_all, fields(wallet_id = %request.wallet.id))]
    async fn checkout(
        &self,
        request: &OfferRequest,
        quote: &ProviderQuote,
        address: &str,
    ) -> Result<CheckoutTicket, ExchangeError> {
        match &quote.raw {
            ProviderQuoteResponse::Wyre(wyre) => reservation::checkout(self, request, wyre, address).await,
            other => Err(ExchangeError::Unsupported(format!("{} quote passed to Wyre checkout", other.provider()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock;
    use crate::provider::fetch_offer;
    use crate::request::tests::usd_btc_request;
    use crate::types::WalletRef;
    use axum::{routing::post, Json, Router};
    use lib_core::PaymentMethod;
    use serde_json::{json, Value};

    struct FixedAddress(Result<String, ExchangeError>);

    #[async_trait]
    impl AddressSource for FixedAddress {
        async fn create_address(&self, _wallet: &WalletRef) -> Result<String, ExchangeError> {
            self.0.clone()
        }
    }

    async fn provider_for(router: Router, address: Result<String, ExchangeError>) -> WyreProvider {
        let base = mock::serve(router).await;
        let client = Arc::new(ExchangeHttpClient::new(base).unwrap());
        WyreProvider::new(client, Arc::new(FixedAddress(address)), Environment::Prod, "bitpay")
    }

    fn quotation_route() -> Router {
        Router::new().route(
            "/v1/service/wyre/walletOrderQuotation",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["dest"], "bitcoin:1Boat");
                assert_eq!(body["env"], "production");
                Json(json!({
                    "id": body["id"],
                    "sourceCurrency": "USD",
                    "sourceAmount": 100.0,
                    "sourceAmountWithoutFees": 96.0,
                    "destCurrency": "BTC",
                    "destAmount": 0.0019,
                }))
            }),
        )
    }

    #[tokio::test]
    async fn test_fetch_uses_prefixed_address() {
        let provider = provider_for(quotation_route(), Ok("1Boat".to_string())).await;
        let request = usd_btc_request(100.0, PaymentMethod::DebitCard);

        let offer = fetch_offer(&provider, &request).await.unwrap();

        assert_eq!(offer.quote.fee, 4.0);
        assert_eq!(offer.quote.crypto_amount, 0.0019);
        assert_eq!(offer.quote.unit_rate, 50_526.31578947);
    }

    #[tokio::test]
    async fn test_address_failure_settles_offer() {
        let provider = provider_for(quotation_route(), Err(ExchangeError::Address("Wallet locked".to_string()))).await;
        let request = usd_btc_request(100.0, PaymentMethod::DebitCard);

        let err = fetch_offer(&provider, &request).await.unwrap_err();

        assert_eq!(err.user_message(), "Wallet locked");
    }

    #[tokio::test]
    async fn test_unsupported_country_reply() {
        let router = Router::new().route(
            "/v1/service/wyre/walletOrderQuotation",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "id": body["id"],
                    "exceptionId": "X-1",
                    "errorCode": "validation.unsupportedCountry",
                    "message": "Unsupported country",
                }))
            }),
        );
        let provider = provider_for(router, Ok("1Boat".to_string())).await;
        let request = usd_btc_request(100.0, PaymentMethod::DebitCard);

        let err = fetch_offer(&provider, &request).await.unwrap_err();

        assert_eq!(err.user_message(), "Country not supported: US");
    }

    #[tokio::test]
    async fn test_checkout_returns_reservation_url() {
        let router = quotation_route().route(
            "/v1/service/wyre/walletOrderReservation",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "id": body["id"],
                    "url": "https://pay.sendwyre.com/purchase?reservation=R-1",
                    "reservation": "R-1",
                }))
            }),
        );
        let provider = provider_for(router, Ok("1Boat".to_string())).await;
        let request = usd_btc_request(100.0, PaymentMethod::DebitCard);
        let offer = fetch_offer(&provider, &request).await.unwrap();

        let ticket = provider.checkout(&request, &offer, "1Boat").await.unwrap();

        assert_eq!(ticket.redirect_url, "https://pay.sendwyre.com/purchase?reservation=R-1");
        assert_eq!(ticket.payment.order_id, "R-1");
        assert_eq!(ticket.payment.provider, ProviderKey::Wyre);
        assert_eq!(ticket.payment.fiat_total_amount, 100.0);
    }
}
