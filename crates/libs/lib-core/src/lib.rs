//! # Core Library
//!
//! Core models, persistence, configuration, and error handling for the buy-crypto service.

pub mod config;
pub mod error;
pub mod model;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use model::buy_crypto::{Environment, PaymentMethod, ProviderKey, WalletNetwork};
pub use model::store::{create_pool, DbPool, PaymentRepository, PaymentStore};
