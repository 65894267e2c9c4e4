//! # Offer Request Builder
//!
//! Validates the user's purchase parameters and derives, per provider, whether
//! an offer should be requested at all.

use crate::capability::{fiat_limits, is_payment_method_supported};
use crate::types::{FiatLimits, WalletRef};
use lib_core::{AppError, PaymentMethod, ProviderKey};
use lib_utils::validation::{
    validate_country_code, validate_currency_code, validate_identifier, validate_not_empty, validate_positive_amount,
};
use serde::{Deserialize, Serialize};

/// A buy-crypto request as entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRequest {
    /// Fiat amount to spend, fees included
    pub amount: f64,
    /// Upper-case fiat currency code
    pub fiat_currency: String,
    /// Lower-case coin code
    pub coin: String,
    /// Upper-case country code
    pub country: String,
    pub payment_method: PaymentMethod,
    pub wallet: WalletRef,
}

/// Per-provider outcome of the capability lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderPlan {
    pub provider: ProviderKey,
    pub visible: bool,
    pub limits: FiatLimits,
}

impl OfferRequest {
    /// Validate and normalize a request.
    pub fn new(
        amount: f64,
        fiat_currency: &str,
        coin: &str,
        country: &str,
        payment_method: PaymentMethod,
        wallet: WalletRef,
    ) -> Result<Self, AppError> {
        validate_positive_amount(amount, "amount").map_err(AppError::InvalidInput)?;
        validate_currency_code(fiat_currency).map_err(AppError::InvalidInput)?;
        validate_not_empty(coin, "coin").map_err(AppError::InvalidInput)?;
        validate_country_code(country).map_err(AppError::InvalidInput)?;
        validate_identifier(&wallet.id, "wallet id").map_err(AppError::InvalidInput)?;

        let coin = coin.trim().to_lowercase();
        if !wallet.coin.eq_ignore_ascii_case(&coin) {
            return Err(AppError::InvalidInput(format!(
                "Wallet {} holds {}, not {}",
                wallet.id, wallet.coin, coin
            )));
        }

        Ok(Self {
            amount,
            fiat_currency: fiat_currency.trim().to_uppercase(),
            coin,
            country: country.trim().to_uppercase(),
            payment_method,
            wallet,
        })
    }

    /// Whether `provider` should be asked for an offer.
    pub fn is_visible(&self, provider: ProviderKey) -> bool {
        is_payment_method_supported(provider, self.payment_method, &self.coin, &self.fiat_currency)
    }

    /// Capability plan for every provider, in insertion order.
    pub fn plan(&self) -> Vec<ProviderPlan> {
        ProviderKey::ALL
            .iter()
            .map(|&provider| ProviderPlan {
                provider,
                visible: self.is_visible(provider),
                limits: fiat_limits(provider),
            })
            .collect()
    }
}
