//! # Simplex
//!
//! Quote and payment request for Simplex, both relayed by the wallet service.
//! The quote is requested in fiat; the user lands on the wallet service's
//! redirect page, which forwards them to Simplex with the payment request ids.

pub mod payment;
pub mod quote;
pub mod types;

use crate::client::ExchangeHttpClient;
use crate::error::ExchangeError;
use crate::provider::{CheckoutTicket, ExchangeProvider, ProviderQuote, ProviderQuoteResponse};
use crate::request::OfferRequest;
use async_trait::async_trait;
use lib_core::{Environment, ProviderKey};
use std::sync::Arc;
use tracing::instrument;

#[derive(Clone)]
pub struct SimplexProvider {
    client: Arc<ExchangeHttpClient>,
    env: Environment,
    app_scheme: String,
}

impl SimplexProvider {
    pub fn new(client: Arc<ExchangeHttpClient>, env: Environment, app_scheme: impl Into<String>) -> Self {
        Self {
            client,
            env,
            app_scheme: app_scheme.into(),
        }
    }
}

#[async_trait]
impl ExchangeProvider for SimplexProvider {
    fn key(&self) -> ProviderKey {
        ProviderKey::Simplex
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
            ProviderQuoteResponse::Simplex(simplex) => payment::checkout(self, request, simplex, address).await,
            other => Err(ExchangeError::Unsupported(format!("{} quote passed to Simplex checkout", other.provider()))),
        }
    }
}
