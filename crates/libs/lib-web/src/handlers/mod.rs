//! # HTTP Request Handlers
//!
//! Axum handlers grouped by feature. Handlers extract input, delegate to
//! [`crate::services`] and the payment store, and map failures through
//! [`lib_core::AppError`].
//!
//! ## Handler Modules
//!
//! - **[`buy_crypto`]**: Offer sessions and the checkout confirmation flow
//!   - `POST /api/buy-crypto/offers` - Query every provider for a purchase
//!   - `GET /api/buy-crypto/offers/{session_id}` - Current offers and checkout state
//!   - `POST /api/buy-crypto/offers/{session_id}/{provider}/expand` - Toggle offer details
//!   - `POST /api/buy-crypto/offers/{session_id}/{provider}/checkout` - Select an offer
//!   - `POST /api/buy-crypto/offers/{session_id}/checkout/confirm` - Continue to the provider
//!   - `POST /api/buy-crypto/offers/{session_id}/checkout/cancel` - Dismiss the interstitial
//!
//! - **[`payments`]**: Pending payments handed off to providers
//!   - `GET /api/buy-crypto/payments`
//!   - `PUT /api/buy-crypto/payments/{provider}/{order_id}/status`
//!   - `DELETE /api/buy-crypto/payments/{provider}/{order_id}`

pub mod buy_crypto;
pub mod payments;
