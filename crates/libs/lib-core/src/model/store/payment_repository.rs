//! # Pending Payment Repository
//!
//! SQLite implementation of [`PaymentStore`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use lib_core::model::store::{create_pool, PaymentRepository, PaymentStore, MIGRATOR};
//! use lib_core::Environment;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = create_pool("sqlite:data/buy_crypto.db").await?;
//! MIGRATOR.run(&pool).await?;
//!
//! let repo = PaymentRepository::new(pool);
//! let payments = repo.list(Environment::Prod).await?;
//! println!("{} pending payments", payments.len());
//! # Ok(())
//! # }
//! ```

use super::models::{NewPendingPayment, PaymentStatus, PendingPayment, PendingPaymentRow};
use super::{DbPool, PaymentStore};
use crate::model::buy_crypto::{Environment, ProviderKey};
use crate::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::query_as;
use tracing::debug;

/// Pending payment repository backed by SQLite.
#[derive(Clone)]
pub struct PaymentRepository {
    pool: DbPool,
}

impl PaymentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentStore for PaymentRepository {
    async fn insert(&self, payment: NewPendingPayment) -> Result<PendingPayment> {
        let status = PaymentStatus::PaymentRequestSent;
        let created_on = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO pending_payments (env, provider, order_id, payment_id, address, coin, crypto_amount,
                fiat_base_amount, fiat_total_amount, fiat_total_amount_currency, status, user_id, created_on)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#
        )
        .bind(payment.env.as_str())
        .bind(payment.provider.as_str())
        .bind(&payment.order_id)
        .bind(&payment.payment_id)
        .bind(&payment.address)
        .bind(&payment.coin)
        .bind(payment.crypto_amount)
        .bind(payment.fiat_base_amount)
        .bind(payment.fiat_total_amount)
        .bind(&payment.fiat_total_amount_currency)
        .bind(status.to_string())
        .bind(&payment.user_id)
        .bind(created_on)
        .execute(&self.pool)
        .await?;

        debug!(
            provider = %payment.provider,
            order_id = %payment.order_id,
            env = %payment.env,
            "Pending payment recorded"
        );

        // Fetch the created record (should always succeed after insert)
        self.find(payment.env, payment.provider, &payment.order_id)
            .await?
            .ok_or_else(|| AppError::Internal("Inserted payment not found".to_string()))
    }

    async fn list(&self, env: Environment) -> Result<Vec<PendingPayment>> {
        let rows = query_as::<_, PendingPaymentRow>(
            "SELECT * FROM pending_payments WHERE env = ? ORDER BY created_on DESC, id DESC"
        )
        .bind(env.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PendingPayment::try_from).collect()
    }

    async fn find(&self, env: Environment, provider: ProviderKey, order_id: &str) -> Result<Option<PendingPayment>> {
        let row = query_as::<_, PendingPaymentRow>(
            "SELECT * FROM pending_payments WHERE env = ? AND provider = ? AND order_id = ?"
        )
        .bind(env.as_str())
        .bind(provider.as_str())
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PendingPayment::try_from).transpose()
    }

    async fn update_status(
        &self,
        env: Environment,
        provider: ProviderKey,
        order_id: &str,
        status: PaymentStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE pending_payments
            SET status = ?, updated_on = ?
            WHERE env = ? AND provider = ? AND order_id = ?
            "#
        )
        .bind(status.to_string())
        .bind(Utc::now())
        .bind(env.as_str())
        .bind(provider.as_str())
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("No {} payment with order id {}", provider, order_id)));
        }

        Ok(())
    }

    async fn remove(&self, env: Environment, provider: ProviderKey, order_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM pending_payments WHERE env = ? AND provider = ? AND order_id = ?"
        )
        .bind(env.as_str())
        .bind(provider.as_str())
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
