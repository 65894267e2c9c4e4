//! # Services Layer
//!
//! Business logic between the HTTP handlers and the exchange integrations:
//!
//! ```text
//! Handlers (HTTP) → Services → lib-exchange providers / PaymentStore
//! ```
//!
//! - [`offers`] - concurrent offer aggregation and the per-request offer board
//! - [`checkout`] - confirmation state machine and payment page hand-off
//! - [`sessions`] - settled offer boards kept between requests

pub mod checkout;
pub mod offers;
pub mod sessions;

pub use checkout::{BrowserHandoff, CheckoutService, CheckoutState, ClientHandoff, Handoff, Interstitial};
pub use offers::{Offer, OfferAggregator, OfferBoard, OfferFeed, OfferStatus, OfferUpdate};
pub use sessions::{follow_feed, OfferSession, OfferSessions};
