use crate::model::buy_crypto::{Environment, ProviderKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PaymentStatus {
    PaymentRequestSent,
    Processing,
    Success,
    Failed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::PaymentRequestSent => write!(f, "paymentRequestSent"),
            PaymentStatus::Processing => write!(f, "processing"),
            PaymentStatus::Success => write!(f, "success"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "paymentrequestsent" => Ok(PaymentStatus::PaymentRequestSent),
            "processing" => Ok(PaymentStatus::Processing),
            "success" => Ok(PaymentStatus::Success),
            "failed" => Ok(PaymentStatus::Failed),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(s: String) -> Self {
        use std::str::FromStr;
        // Unknown statuses written by an older reconciler are treated as failed
        PaymentStatus::from_str(&s).unwrap_or(PaymentStatus::Failed)
    }
}

/// Payment handed off to an external provider, awaiting reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingPayment {
    pub id: i64,
    pub env: Environment,
    pub provider: ProviderKey,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub address: String,
    pub coin: String,
    pub crypto_amount: f64,
    pub fiat_base_amount: f64,
    pub fiat_total_amount: f64,
    pub fiat_total_amount_currency: String,
    pub status: PaymentStatus,
    pub user_id: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}

/// Data required to record a new pending payment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPendingPayment {
    pub env: Environment,
    pub provider: ProviderKey,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub address: String,
    pub coin: String,
    pub crypto_amount: f64,
    pub fiat_base_amount: f64,
    pub fiat_total_amount: f64,
    pub fiat_total_amount_currency: String,
    pub user_id: String,
}

/// Raw table row; enum columns are decoded in [`TryFrom`].
#[derive(Debug, FromRow)]
pub(crate) struct PendingPaymentRow {
    pub id: i64,
    pub env: String,
    pub provider: String,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub address: String,
    pub coin: String,
    pub crypto_amount: f64,
    pub fiat_base_amount: f64,
    pub fiat_total_amount: f64,
    pub fiat_total_amount_currency: String,
    pub status: String,
    pub user_id: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl TryFrom<PendingPaymentRow> for PendingPayment {
    type Error = crate::AppError;

    fn try_from(row: PendingPaymentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            env: row.env.parse().map_err(crate::AppError::Decoding)?,
            provider: row.provider.parse().map_err(crate::AppError::Decoding)?,
            order_id: row.order_id,
            payment_id: row.payment_id,
            address: row.address,
            coin: row.coin,
            crypto_amount: row.crypto_amount,
            fiat_base_amount: row.fiat_base_amount,
            fiat_total_amount: row.fiat_total_amount,
            fiat_total_amount_currency: row.fiat_total_amount_currency,
            status: PaymentStatus::from(row.status),
            user_id: row.user_id,
            created_on: row.created_on,
            updated_on: row.updated_on,
        })
    }
}
