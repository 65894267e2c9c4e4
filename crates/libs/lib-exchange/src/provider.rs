//! # Exchange Provider Seam
//!
//! One implementation per provider. The aggregator and checkout only ever see
//! [`ExchangeProvider`] and the tagged [`ProviderQuoteResponse`].

use crate::coins::{coin_info, round_to_decimals};
use crate::error::ExchangeError;
use crate::request::OfferRequest;
use crate::simplex::types::SimplexQuote;
use crate::types::{FiatLimits, Quote};
use crate::wyre::types::WyreQuote;
use async_trait::async_trait;
use lib_core::model::store::NewPendingPayment;
use lib_core::ProviderKey;
use serde::Serialize;
use tracing::{debug, instrument, warn};

const WYRE_RATE_DECIMALS: u32 = 8;
const DEFAULT_RATE_DECIMALS: u32 = 8;

/// Provider reply as received, kept for the checkout step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderQuoteResponse {
    Simplex(SimplexQuote),
    Wyre(WyreQuote),
}

impl ProviderQuoteResponse {
    pub fn provider(&self) -> ProviderKey {
        match self {
            ProviderQuoteResponse::Simplex(_) => ProviderKey::Simplex,
            ProviderQuoteResponse::Wyre(_) => ProviderKey::Wyre,
        }
    }

    /// Map the provider reply onto the common [`Quote`] shape.
    pub fn normalize(&self, coin: &str) -> Result<Quote, ExchangeError> {
        match self {
            ProviderQuoteResponse::Simplex(q) => {
                let decimals = coin_info(coin).map_or(DEFAULT_RATE_DECIMALS, |c| c.unit_decimals);
                build_quote(
                    ProviderKey::Simplex,
                    q.digital_money.amount,
                    q.fiat_money.base_amount,
                    q.fiat_money.total_amount,
                    decimals,
                )
            }
            ProviderQuoteResponse::Wyre(q) => build_quote(
                ProviderKey::Wyre,
                q.dest_amount,
                q.source_amount_without_fees,
                q.source_amount,
                WYRE_RATE_DECIMALS,
            ),
        }
    }
}

/// A normalized quote together with the reply it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderQuote {
    pub quote: Quote,
    pub raw: ProviderQuoteResponse,
}

/// Outcome of a provider checkout: where to send the user, and what to remember.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutTicket {
    pub redirect_url: String,
    pub payment: NewPendingPayment,
}

#[async_trait]
pub trait ExchangeProvider: Send + Sync {
    fn key(&self) -> ProviderKey;

    fn limits(&self) -> FiatLimits {
        crate::capability::fiat_limits(self.key())
    }

    /// Request a quote. Limits have already been checked by [`fetch_offer`].
    async fn fetch_quote(&self, request: &OfferRequest) -> Result<ProviderQuote, ExchangeError>;

    /// Create the provider-side order for a previously fetched quote.
    async fn checkout(
        &self,
        request: &OfferRequest,
        quote: &ProviderQuote,
        address: &str,
    ) -> Result<CheckoutTicket, ExchangeError>;
}

/// Inclusive limits pre-check. No network call happens for a rejected amount.
pub fn check_limits(provider: ProviderKey, limits: FiatLimits, request: &OfferRequest) -> Result<(), ExchangeError> {
    if limits.contains(request.amount) {
        return Ok(());
    }
    Err(ExchangeError::OutOfLimits {
        provider,
        min: limits.min,
        max: limits.max,
        currency: request.fiat_currency.clone(),
    })
}

/// Fetch one provider's offer for `request`.
#[instrument(skip_all, fields(provider = %provider.key(), amount = request.amount))]
pub async fn fetch_offer(provider: &dyn ExchangeProvider, request: &OfferRequest) -> Result<ProviderQuote, ExchangeError> {
    check_limits(provider.key(), provider.limits(), request)?;

    match provider.fetch_quote(request).await {
        Ok(quote) => {
            debug!(crypto_amount = quote.quote.crypto_amount, fee = quote.quote.fee, "Quote received");
            Ok(quote)
        }
        Err(e) => {
            warn!(kind = ?e.kind(), error = %e, "Quote fetch failed");
            Err(e)
        }
    }
}

/// Build a [`Quote`], rejecting replies that cannot be right.
pub fn build_quote(
    provider: ProviderKey,
    crypto_amount: f64,
    fiat_base_amount: f64,
    fiat_total_amount: f64,
    rate_decimals: u32,
) -> Result<Quote, ExchangeError> {
    let fee = fiat_total_amount - fiat_base_amount;
    if fee < 0.0 {
        return Err(ExchangeError::NegativeFee { provider, fee });
    }
    if !crypto_amount.is_finite() || crypto_amount <= 0.0 {
        return Err(ExchangeError::MalformedQuote {
            provider,
            detail: format!("crypto amount {}", crypto_amount),
        });
    }

    Ok(Quote {
        crypto_amount,
        fiat_base_amount,
        fiat_total_amount,
        fee,
        unit_rate: round_to_decimals(fiat_base_amount / crypto_amount, rate_decimals),
    })
}
