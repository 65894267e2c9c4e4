//! # Buy-Crypto Vocabulary
//!
//! Closed sets shared by the exchange integrations, the store and the web layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exchange providers able to sell crypto into a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKey {
    Simplex,
    Wyre,
}

impl ProviderKey {
    /// Every supported provider, in display insertion order.
    pub const ALL: [ProviderKey; 2] = [ProviderKey::Simplex, ProviderKey::Wyre];

    /// Stable identifier used in URLs and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKey::Simplex => "simplex",
            ProviderKey::Wyre => "wyre",
        }
    }

    /// Human-readable provider name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKey::Simplex => "Simplex",
            ProviderKey::Wyre => "Wyre",
        }
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simplex" => Ok(ProviderKey::Simplex),
            "wyre" => Ok(ProviderKey::Wyre),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Payment method selected by the user on the amount screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    ApplePay,
    SepaBankTransfer,
}

/// Deployment environment. Pending payments are scoped by it and it selects the
/// provider sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }

    /// Value of the `env` field expected by the provider proxy.
    pub fn provider_env(&self) -> &'static str {
        match self {
            Environment::Dev => "sandbox",
            Environment::Prod => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

/// Network of the wallet receiving the purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletNetwork {
    #[default]
    Livenet,
    Testnet,
}
