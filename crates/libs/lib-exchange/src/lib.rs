//! # Exchange Library
//!
//! Buy-crypto provider integrations: capability lookup, request building, quote
//! fetching and normalization, and provider checkout (payment request / order
//! reservation) through the wallet service proxy.

// region: --- Modules
pub mod capability;
pub mod client;
pub mod coins;
pub mod error;
pub mod provider;
pub mod request;
pub mod simplex;
pub mod types;
pub mod wallet;
pub mod wyre;

#[cfg(test)]
pub(crate) mod mock;
// endregion: --- Modules

// region: --- Re-exports
pub use client::{ExchangeClientBuilder, ExchangeHttpClient};
pub use error::{ErrorKind, ExchangeError};
pub use provider::{fetch_offer, CheckoutTicket, ExchangeProvider, ProviderQuote, ProviderQuoteResponse};
pub use request::{OfferRequest, ProviderPlan};
pub use simplex::SimplexProvider;
pub use types::{FiatLimits, Quote, WalletRef};
pub use wallet::{AddressSource, HttpAddressSource};
pub use wyre::WyreProvider;
// endregion: --- Re-exports
