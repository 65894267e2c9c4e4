//! # Offer Aggregation Service
//!
//! Fans a buy request out to every visible provider at once and collects each
//! provider's terminal outcome into its own slot of an [`OfferBoard`].
//!
//! ## Flow
//!
//! ```text
//! OfferAggregator::start ─┬─ task(simplex) ─┐
//!                         └─ task(wyre)    ─┴─ mpsc ─▶ OfferFeed ─▶ OfferBoard
//! ```
//!
//! Each task sends exactly one [`OfferUpdate`]; the board applies it to that
//! provider's slot only, and ignores anything after the first. Dropping the
//! feed aborts the tasks that are still in flight.

use lib_core::{AppError, ProviderKey};
use lib_exchange::error::GENERIC_OFFER_ERROR;
use lib_exchange::{fetch_offer, ExchangeError, ExchangeProvider, FiatLimits, OfferRequest, ProviderPlan, ProviderQuote, ProviderQuoteResponse, Quote};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

// region: --- Offer

/// Settlement state of one provider's offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "camelCase")]
pub enum OfferStatus {
    Loading,
    Quoted(Quote),
    /// Amount outside the provider's limits; carries the user-facing message
    OutOfLimits(String),
    /// Any other failure; carries the user-facing message
    Failed(String),
}

impl OfferStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, OfferStatus::Loading)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub provider: ProviderKey,
    pub visible: bool,
    pub limits: FiatLimits,
    pub status: OfferStatus,
    pub expanded: bool,
    /// Provider reply behind a `Quoted` status, needed for checkout
    #[serde(skip)]
    pub raw: Option<ProviderQuoteResponse>,
}

impl Offer {
    fn blank(plan: &ProviderPlan) -> Self {
        Self {
            provider: plan.provider,
            visible: plan.visible,
            limits: plan.limits,
            status: OfferStatus::Loading,
            expanded: false,
            raw: None,
        }
    }

    pub fn quote(&self) -> Option<&Quote> {
        match &self.status {
            OfferStatus::Quoted(quote) => Some(quote),
            _ => None,
        }
    }

    /// The quote together with its provider reply, if this offer was quoted.
    pub fn provider_quote(&self) -> Option<ProviderQuote> {
        match (&self.status, &self.raw) {
            (OfferStatus::Quoted(quote), Some(raw)) => Some(ProviderQuote { quote: *quote, raw: raw.clone() }),
            _ => None,
        }
    }
}

/// Terminal outcome of one provider fetch.
#[derive(Debug, Clone)]
pub struct OfferUpdate {
    pub provider: ProviderKey,
    pub outcome: Result<ProviderQuote, ExchangeError>,
}

// endregion: --- Offer

// region: --- OfferBoard

/// All offers of one aggregation, in provider insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferBoard {
    offers: Vec<Offer>,
}

impl OfferBoard {
    pub fn new(plan: &[ProviderPlan]) -> Self {
        Self {
            offers: plan.iter().map(Offer::blank).collect(),
        }
    }

    pub fn offer(&self, provider: ProviderKey) -> Option<&Offer> {
        self.offers.iter().find(|o| o.provider == provider)
    }

    /// Apply a fetch outcome to its provider's slot.
    ///
    /// Returns `false` when the slot is unknown or already settled.
    pub fn apply(&mut self, update: OfferUpdate) -> bool {
        let Some(slot) = self.offers.iter_mut().find(|o| o.provider == update.provider) else {
            return false;
        };
        if slot.status.is_settled() {
            debug!(provider = %update.provider, "Ignoring duplicate offer update");
            return false;
        }

        let (status, raw) = match update.outcome {
            Ok(quote) => (OfferStatus::Quoted(quote.quote), Some(quote.raw)),
            Err(e) if e.is_policy_rejection() => (OfferStatus::OutOfLimits(e.user_message()), None),
            Err(e) => (OfferStatus::Failed(e.user_message()), None),
        };

        *slot = Offer { status, raw, ..slot.clone() };
        true
    }

    /// Flip the details panel of a quoted offer.
    pub fn toggle_expanded(&mut self, provider: ProviderKey) -> Result<bool, AppError> {
        let slot = self
            .offers
            .iter_mut()
            .find(|o| o.provider == provider && o.visible)
            .ok_or_else(|| AppError::NotFound(format!("No {} offer", provider)))?;

        if slot.quote().is_none() {
            return Err(AppError::InvalidInput(format!("{} offer has no quote to expand", provider)));
        }

        slot.expanded = !slot.expanded;
        Ok(slot.expanded)
    }

    /// Whether every visible offer has reached a terminal status.
    pub fn is_settled(&self) -> bool {
        self.offers.iter().filter(|o| o.visible).all(|o| o.status.is_settled())
    }

    /// Visible offers in display order: quoted first by descending crypto
    /// amount, then the rest in insertion order.
    pub fn sorted(&self) -> Vec<&Offer> {
        let mut quoted: Vec<&Offer> = self.offers.iter().filter(|o| o.visible && o.quote().is_some()).collect();
        quoted.sort_by(|a, b| {
            let (a, b) = (a.quote().map_or(0.0, |q| q.crypto_amount), b.quote().map_or(0.0, |q| q.crypto_amount));
            b.partial_cmp(&a).unwrap_or(Ordering::Equal)
        });

        let rest = self.offers.iter().filter(|o| o.visible && o.quote().is_none());
        quoted.into_iter().chain(rest).collect()
    }

    pub(crate) fn fail_unsettled(&mut self, message: &str) {
        for slot in self.offers.iter_mut().filter(|o| o.visible && !o.status.is_settled()) {
            slot.status = OfferStatus::Failed(message.to_string());
        }
    }
}

// endregion: --- OfferBoard

// region: --- OfferAggregator

/// Starts one concurrent fetch per visible provider.
pub struct OfferAggregator {
    providers: Vec<Arc<dyn ExchangeProvider>>,
}

impl OfferAggregator {
    pub fn new(providers: Vec<Arc<dyn ExchangeProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider(&self, key: ProviderKey) -> Option<Arc<dyn ExchangeProvider>> {
        self.providers.iter().find(|p| p.key() == key).cloned()
    }

    #[instrument(skip_all, fields(amount = request.amount, coin = %request.coin, fiat = %request.fiat_currency))]
    pub fn start(&self, request: OfferRequest) -> OfferFeed {
        let plan = request.plan();
        let mut board = OfferBoard::new(&plan);
        let (tx, rx) = mpsc::unbounded_channel();
        let request = Arc::new(request);
        let mut tasks = Vec::new();

        for entry in plan.iter().filter(|p| p.visible) {
            let Some(provider) = self.provider(entry.provider) else {
                warn!(provider = %entry.provider, "No integration registered for visible provider");
                board.apply(OfferUpdate {
                    provider: entry.provider,
                    outcome: Err(ExchangeError::Unsupported(entry.provider.to_string())),
                });
                continue;
            };

            let tx = tx.clone();
            let request = Arc::clone(&request);
            tasks.push(tokio::spawn(async move {
                let outcome = fetch_offer(provider.as_ref(), &request).await;
                let update = OfferUpdate { provider: provider.key(), outcome };
                if tx.send(update).is_err() {
                    debug!(provider = %provider.key(), "Offer feed dropped before completion");
                }
            }));
        }

        info!(fetches = tasks.len(), "Offer aggregation started");
        OfferFeed { board, rx, tasks }
    }
}

// endregion: --- OfferAggregator

// region: --- OfferFeed

/// Live view of one aggregation. Dropping it cancels the fetches.
pub struct OfferFeed {
    board: OfferBoard,
    rx: mpsc::UnboundedReceiver<OfferUpdate>,
    tasks: Vec<JoinHandle<()>>,
}

impl OfferFeed {
    pub fn board(&self) -> &OfferBoard {
        &self.board
    }

    /// Wait for the next provider outcome, apply it to the feed's board and
    /// hand it back so other views of the aggregation can apply it too.
    ///
    /// Returns `None` once the board is settled. A fetch task that died
    /// without reporting fails its offer with the generic message.
    pub async fn next_update(&mut self) -> Option<OfferUpdate> {
        while !self.board.is_settled() {
            let Some(update) = self.rx.recv().await else {
                warn!("Offer fetch ended without reporting");
                self.board.fail_unsettled(GENERIC_OFFER_ERROR);
                return None;
            };
            if self.board.apply(update.clone()) {
                return Some(update);
            }
        }
        None
    }
}

impl Drop for OfferFeed {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

// endregion: --- OfferFeed
