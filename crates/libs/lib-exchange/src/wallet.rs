//! # Receiving Address Source
//!
//! The wallet collaborator that hands out a receiving address for a purchase.

use crate::client::ExchangeHttpClient;
use crate::error::ExchangeError;
use crate::types::WalletRef;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};

#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Return the wallet's current receiving address, creating one if needed.
    async fn create_address(&self, wallet: &WalletRef) -> Result<String, ExchangeError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAddressBody {
    /// Reuse the current unused address instead of deriving a new one
    reuse: bool,
}

#[derive(Deserialize)]
struct AddressReply {
    address: Option<String>,
    message: Option<String>,
}

/// `/v1/wallets/{id}/addresses` with the id confined to one path segment.
fn address_path(wallet_id: &str) -> Result<String, ExchangeError> {
    if wallet_id.is_empty() || wallet_id == "." || wallet_id == ".." {
        return Err(ExchangeError::Address(format!("Invalid wallet id: {:?}", wallet_id)));
    }
    Ok(format!("/v1/wallets/{}/addresses", urlencoding::encode(wallet_id)))
}

/// [`AddressSource`] backed by the wallet service.
#[derive(Clone)]
pub struct HttpAddressSource {
    client: Arc<ExchangeHttpClient>,
}

impl HttpAddressSource {
    pub fn new(client: Arc<ExchangeHttpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AddressSource for HttpAddressSource {
    #[instrument(skip_all, fields(wallet_id = %wallet.id))]
    async fn create_address(&self, wallet: &WalletRef) -> Result<String, ExchangeError> {
        let path = address_path(&wallet.id)?;
        let response = self.client.post_plain(&path, &CreateAddressBody { reuse: true }).await?;

        let reply: AddressReply = serde_json::from_value(response.body)
            .map_err(|e| ExchangeError::Address(format!("Could not read the wallet address: {}", e)))?;

        match (response.status.is_success(), reply.address) {
            (true, Some(address)) if !address.is_empty() => Ok(address),
            _ => {
                let message = reply
                    .message
                    .unwrap_or_else(|| "Could not create address for the selected wallet".to_string());
                warn!(status = %response.status, "Address creation failed: {}", message);
                Err(ExchangeError::Address(message))
            }
        }
    }
}
