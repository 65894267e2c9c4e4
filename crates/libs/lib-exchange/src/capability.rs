//! # Provider Capabilities
//!
//! Static lookup of which provider can sell which coin, for which fiat currency,
//! through which payment method, and within which fiat bounds. No I/O.

use crate::types::FiatLimits;
use lib_core::{PaymentMethod, ProviderKey};

pub const SIMPLEX_FIAT_LIMITS: FiatLimits = FiatLimits::new(50.0, 20_000.0);
pub const WYRE_FIAT_LIMITS: FiatLimits = FiatLimits::new(50.0, 2_500.0);

const SIMPLEX_COINS: &[&str] = &["btc", "bch", "eth", "xrp", "doge", "ltc"];
const SIMPLEX_FIAT: &[&str] = &[
    "AUD", "BRL", "CAD", "CHF", "CZK", "DKK", "EUR", "GBP", "HKD", "ILS", "INR", "JPY", "KRW",
    "MXN", "NOK", "NZD", "PLN", "SEK", "SGD", "TRY", "USD", "ZAR",
];

const WYRE_COINS: &[&str] = &["btc", "bch", "eth", "doge"];
const WYRE_FIAT: &[&str] = &["AUD", "CAD", "EUR", "GBP", "USD"];

/// Fiat bounds of a provider.
pub fn fiat_limits(provider: ProviderKey) -> FiatLimits {
    match provider {
        ProviderKey::Simplex => SIMPLEX_FIAT_LIMITS,
        ProviderKey::Wyre => WYRE_FIAT_LIMITS,
    }
}

/// Whether `provider` supports `method` for the `coin`/`fiat_currency` pair.
///
/// Unknown coins and currencies are unsupported.
pub fn is_payment_method_supported(
    provider: ProviderKey,
    method: PaymentMethod,
    coin: &str,
    fiat_currency: &str,
) -> bool {
    let coin = coin.to_lowercase();
    let fiat = fiat_currency.to_uppercase();

    match provider {
        ProviderKey::Simplex => {
            let method_ok = match method {
                PaymentMethod::CreditCard | PaymentMethod::DebitCard | PaymentMethod::ApplePay => true,
                PaymentMethod::SepaBankTransfer => fiat == "EUR",
            };
            method_ok && SIMPLEX_COINS.contains(&coin.as_str()) && SIMPLEX_FIAT.contains(&fiat.as_str())
        }
        ProviderKey::Wyre => {
            let method_ok = matches!(method, PaymentMethod::DebitCard | PaymentMethod::ApplePay);
            method_ok && WYRE_COINS.contains(&coin.as_str()) && WYRE_FIAT.contains(&fiat.as_str())
        }
    }
}
