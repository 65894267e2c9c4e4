//! # Exchange Types
//!
//! Provider-independent records shared by the fetchers, the aggregator and checkout.

use chrono::{DateTime, Utc};
use lib_core::WalletNetwork;
use serde::{Deserialize, Serialize};

/// Wallet selected to receive the purchased crypto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRef {
    /// Wallet id, also sent to providers as the end-user id
    pub id: String,
    /// Coin held by the wallet (lower-case, e.g. `btc`)
    pub coin: String,
    #[serde(default)]
    pub network: WalletNetwork,
    /// When the wallet app was first set up; reported to Simplex as the install date
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,
}

/// Fiat purchase bounds published by a provider. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiatLimits {
    pub min: f64,
    pub max: f64,
}

impl FiatLimits {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// Normalized quote, identical in shape for every provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Crypto the user receives
    pub crypto_amount: f64,
    /// Fiat spent on crypto, fees excluded
    pub fiat_base_amount: f64,
    /// Fiat charged, fees included
    pub fiat_total_amount: f64,
    /// `fiat_total_amount - fiat_base_amount`, never negative
    pub fee: f64,
    /// Fiat price of one coin unit, fees excluded
    pub unit_rate: f64,
}
