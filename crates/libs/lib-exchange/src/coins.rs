//! # Coin Table
//!
//! Unit precision and payment-URI protocol prefixes of the coins the wallet can buy.

use crate::error::ExchangeError;
use lib_core::WalletNetwork;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinInfo {
    pub code: &'static str,
    pub unit_decimals: u32,
    pub livenet_prefix: &'static str,
    pub testnet_prefix: &'static str,
}

impl CoinInfo {
    pub fn protocol_prefix(&self, network: WalletNetwork) -> &'static str {
        match network {
            WalletNetwork::Livenet => self.livenet_prefix,
            WalletNetwork::Testnet => self.testnet_prefix,
        }
    }
}

const COINS: &[CoinInfo] = &[
    CoinInfo { code: "btc", unit_decimals: 8, livenet_prefix: "bitcoin", testnet_prefix: "bitcoin" },
    CoinInfo { code: "bch", unit_decimals: 8, livenet_prefix: "bitcoincash", testnet_prefix: "bchtest" },
    CoinInfo { code: "eth", unit_decimals: 18, livenet_prefix: "ethereum", testnet_prefix: "ethereum" },
    CoinInfo { code: "xrp", unit_decimals: 6, livenet_prefix: "ripple", testnet_prefix: "ripple" },
    CoinInfo { code: "doge", unit_decimals: 8, livenet_prefix: "dogecoin", testnet_prefix: "dogecoin" },
    CoinInfo { code: "ltc", unit_decimals: 8, livenet_prefix: "litecoin", testnet_prefix: "litecoin" },
];

/// Look up a coin by its code, case-insensitively.
pub fn coin_info(coin: &str) -> Option<&'static CoinInfo> {
    let coin = coin.to_lowercase();
    COINS.iter().find(|info| info.code == coin)
}

/// Prefix an address with the coin's payment-URI scheme (`bitcoin:1Boat...`).
///
/// Addresses that already carry a scheme are returned unchanged.
pub fn with_protocol_prefix(address: &str, coin: &str, network: WalletNetwork) -> Result<String, ExchangeError> {
    if address.contains(':') {
        return Ok(address.to_string());
    }

    let info = coin_info(coin)
        .ok_or_else(|| ExchangeError::Unsupported(format!("coin {}", coin)))?;

    Ok(format!("{}:{}", info.protocol_prefix(network), address))
}

/// Round to a fixed number of decimals, the way fiat rates are displayed.
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals.min(18) as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_prefix() {
        let addr = with_protocol_prefix("qpm2qsznhks23z7629mms6s4cwef74vcwvy22gdx6a", "BCH", WalletNetwork::Livenet).unwrap();
        assert_eq!(addr, "bitcoincash:qpm2qsznhks23z7629mms6s4cwef74vcwvy22gdx6a");

        let addr = with_protocol_prefix("qq0000", "bch", WalletNetwork::Testnet).unwrap();
        assert_eq!(addr, "bchtest:qq0000");
    }

    #[test]
    fn test_prefixed_address_untouched() {
        let addr = with_protocol_prefix("bitcoin:1Boat", "btc", WalletNetwork::Livenet).unwrap();
        assert_eq!(addr, "bitcoin:1Boat");
    }

    #[test]
    fn test_unknown_coin() {
        assert!(with_protocol_prefix("abc", "shib", WalletNetwork::Livenet).is_err());
        assert!(coin_info("shib").is_none());
    }

    #[test]
    fn test_round_to_decimals() {
        assert_eq!(round_to_decimals(50_000.123456789, 8), 50_000.12345679);
        assert_eq!(round_to_decimals(1.005, 0), 1.0);
    }
}
