//! # Database Store
//!
//! Database connection pool, embedded migrations and the pending-payment store.

// region: --- Modules
pub mod models;
pub mod payment_repository;
// endregion: --- Modules

// region: --- Re-exports
pub use models::{NewPendingPayment, PaymentStatus, PendingPayment};
pub use payment_repository::PaymentRepository;
// endregion: --- Re-exports

// region: --- Types and Functions
use crate::model::buy_crypto::{Environment, ProviderKey};
use crate::Result;
use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};

/// Type alias for SQLite connection pool.
pub type DbPool = SqlitePool;

/// Schema migrations embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create a new SQLite connection pool, creating the database file if missing.
pub async fn create_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let options = database_url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;

    Ok(pool)
}

/// Persisted collection of payments handed off to providers.
///
/// Records are scoped by [`Environment`] and keyed by provider and order id.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Record a new payment with status `paymentRequestSent`.
    async fn insert(&self, payment: NewPendingPayment) -> Result<PendingPayment>;

    /// All payments of an environment, newest first.
    async fn list(&self, env: Environment) -> Result<Vec<PendingPayment>>;

    async fn find(&self, env: Environment, provider: ProviderKey, order_id: &str) -> Result<Option<PendingPayment>>;

    /// Called when the provider return link reports the payment outcome.
    async fn update_status(
        &self,
        env: Environment,
        provider: ProviderKey,
        order_id: &str,
        status: PaymentStatus,
    ) -> Result<()>;

    /// Explicit user removal. Returns `false` when nothing matched.
    async fn remove(&self, env: Environment, provider: ProviderKey, order_id: &str) -> Result<bool>;
}
// endregion: --- Types and Functions
