//! # Checkout Service
//!
//! Takes the user from a selected offer to the provider's payment page.
//!
//! ```text
//! Idle ─begin─▶ AddressPending ─▶ AwaitingConfirmation ─confirm─▶ Redirecting ─▶ Done
//!                     │                 │   │                         │
//!                     └──── Failed ◀────┘   └─cancel─▶ Idle           └─▶ Failed
//! ```
//!
//! `Failed` and `Done` go back to `Idle` through [`CheckoutState::acknowledge`].
//! The pending payment is recorded before the hand-off, so a failed hand-off
//! leaves the record in place.

use async_trait::async_trait;
use lib_core::{AppError, PaymentStore, ProviderKey};
use lib_exchange::{AddressSource, ExchangeProvider, OfferRequest};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::services::offers::Offer;

// region: --- State

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CheckoutState {
    #[default]
    Idle,
    AddressPending { provider: ProviderKey },
    AwaitingConfirmation { provider: ProviderKey, address: String },
    Redirecting { provider: ProviderKey, url: String },
    Done { provider: ProviderKey, url: String },
    Failed { provider: ProviderKey, message: String },
}

impl CheckoutState {
    /// Leave a terminal state and return to offer selection.
    pub fn acknowledge(&mut self) {
        if matches!(self, CheckoutState::Failed { .. } | CheckoutState::Done { .. }) {
            *self = CheckoutState::Idle;
        }
    }

    /// Drop an interstitial without confirming.
    pub fn cancel(&mut self) -> Result<(), AppError> {
        match self {
            CheckoutState::AwaitingConfirmation { .. } => {
                *self = CheckoutState::Idle;
                Ok(())
            }
            other => Err(AppError::Conflict(format!("Nothing to cancel in state {:?}", other))),
        }
    }

    fn fail(&mut self, provider: ProviderKey, message: String) -> AppError {
        *self = CheckoutState::Failed { provider, message: message.clone() };
        AppError::Provider(message)
    }
}

/// Confirmation prompt shown before leaving the app.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interstitial {
    pub provider: ProviderKey,
    pub title: String,
    pub message: String,
}

impl Interstitial {
    pub fn for_provider(provider: ProviderKey) -> Self {
        Self {
            provider,
            title: format!("Continue to {}", provider),
            message: format!("In order to finish the payment process you will be redirected to {}'s page", provider),
        }
    }
}

// endregion: --- State

// region: --- Handoff

/// Opens the provider's payment page.
#[async_trait]
pub trait Handoff: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), AppError>;
}

type Opener = fn(&str) -> std::io::Result<()>;

fn system_browser(url: &str) -> std::io::Result<()> {
    open::that(url)
}

/// Opens the URL in the system browser.
pub struct BrowserHandoff {
    opener: Opener,
}

impl Default for BrowserHandoff {
    fn default() -> Self {
        Self { opener: system_browser }
    }
}

impl BrowserHandoff {
    /// Use `opener` in place of the system browser.
    pub fn with_opener(opener: Opener) -> Self {
        Self { opener }
    }
}

#[async_trait]
impl Handoff for BrowserHandoff {
    async fn open(&self, url: &str) -> Result<(), AppError> {
        let url = url.to_string();
        let opener = self.opener;
        tokio::task::spawn_blocking(move || opener(&url))
            .await
            .map_err(|e| AppError::Internal(format!("Browser task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Couldn't load page: {}", e)))
    }
}

/// Leaves opening the URL to the HTTP client.
pub struct ClientHandoff;

#[async_trait]
impl Handoff for ClientHandoff {
    async fn open(&self, _url: &str) -> Result<(), AppError> {
        Ok(())
    }
}

// endregion: --- Handoff

// region: --- CheckoutService

pub struct CheckoutService {
    store: Arc<dyn PaymentStore>,
    addresses: Arc<dyn AddressSource>,
    handoff: Arc<dyn Handoff>,
}

impl CheckoutService {
    pub fn new(store: Arc<dyn PaymentStore>, addresses: Arc<dyn AddressSource>, handoff: Arc<dyn Handoff>) -> Self {
        Self { store, addresses, handoff }
    }

    /// Start checkout for a quoted offer: create the receiving address and
    /// return the interstitial.
    #[instrument(skip_all, fields(provider = %offer.provider, wallet_id = %request.wallet.id))]
    pub async fn begin(
        &self,
        state: &mut CheckoutState,
        offer: &Offer,
        request: &OfferRequest,
    ) -> Result<Interstitial, AppError> {
        if !matches!(state, CheckoutState::Idle) {
            return Err(AppError::Conflict("A checkout is already in progress".to_string()));
        }
        if offer.provider_quote().is_none() {
            return Err(AppError::InvalidInput(format!("{} has no offer to check out", offer.provider)));
        }

        let provider = offer.provider;
        *state = CheckoutState::AddressPending { provider };

        match self.addresses.create_address(&request.wallet).await {
            Ok(address) => {
                *state = CheckoutState::AwaitingConfirmation { provider, address };
                Ok(Interstitial::for_provider(provider))
            }
            Err(e) => {
                warn!(error = %e, "Receiving address creation failed");
                Err(state.fail(provider, e.user_message()))
            }
        }
    }

    /// Create the provider order, record the pending payment and hand off.
    /// Returns the payment page URL.
    #[instrument(skip_all, fields(provider = %exchange.key()))]
    pub async fn confirm(
        &self,
        state: &mut CheckoutState,
        exchange: &dyn ExchangeProvider,
        offer: &Offer,
        request: &OfferRequest,
    ) -> Result<String, AppError> {
        let CheckoutState::AwaitingConfirmation { provider, address } = state.clone() else {
            return Err(AppError::Conflict("No checkout awaiting confirmation".to_string()));
        };
        if provider != exchange.key() || provider != offer.provider {
            return Err(AppError::InvalidInput(format!("Checkout was started for {}", provider)));
        }
        let Some(quote) = offer.provider_quote() else {
            return Err(state.fail(provider, format!("{} offer is no longer available", provider)));
        };

        let ticket = match exchange.checkout(request, &quote, &address).await {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!(error = %e, "Provider checkout failed");
                return Err(state.fail(provider, e.user_message()));
            }
        };

        if let Err(e) = self.store.insert(ticket.payment).await {
            error!(error = %e, "Failed to record pending payment");
            return Err(state.fail(provider, e.user_message()));
        }

        *state = CheckoutState::Redirecting { provider, url: ticket.redirect_url.clone() };
        if let Err(e) = self.handoff.open(&ticket.redirect_url).await {
            error!(error = %e, "Hand-off to payment page failed");
            return Err(state.fail(provider, e.user_message()));
        }

        info!("Handed off to {} payment page", provider);
        *state = CheckoutState::Done { provider, url: ticket.redirect_url.clone() };
        Ok(ticket.redirect_url)
    }
}

// endregion: --- CheckoutService
