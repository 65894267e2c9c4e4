use super::types::{error_parts, is_error_reply, WyreQuotationBody, WyreQuote, UNSUPPORTED_COUNTRY_CODE};
use super::WyreProvider;
use crate::coins::with_protocol_prefix;
use crate::error::{ExchangeError, GENERIC_OFFER_ERROR};
use crate::provider::{ProviderQuote, ProviderQuoteResponse};
use crate::request::OfferRequest;
use lib_core::{PaymentMethod, ProviderKey};
use serde_json::Value;

pub(super) const QUOTATION_PATH: &str = "/v1/service/wyre/walletOrderQuotation";

pub(super) fn quotation_body(request: &OfferRequest, dest: &str, env: &str) -> WyreQuotationBody {
    let wallet_type = match request.payment_method {
        PaymentMethod::ApplePay => "APPLE_PAY",
        _ => "DEBIT_CARD",
    };

    WyreQuotationBody {
        source_amount: request.amount.to_string(),
        source_currency: request.fiat_currency.clone(),
        dest_currency: request.coin.to_uppercase(),
        dest: dest.to_string(),
        country: request.country.clone(),
        amount_include_fees: true,
        wallet_type: wallet_type.to_string(),
        env: env.to_string(),
    }
}

/// Map a Wyre error object onto a provider error.
pub(super) fn provider_error(body: &Value, country: &str) -> ExchangeError {
    let (code, message) = error_parts(body);

    let message = match (code.as_deref(), message) {
        (Some(UNSUPPORTED_COUNTRY_CODE), _) => format!("Country not supported: {}", country),
        (_, Some(message)) => message,
        (_, None) => GENERIC_OFFER_ERROR.to_string(),
    };

    ExchangeError::Provider {
        provider: ProviderKey::Wyre,
        code,
        message,
    }
}

pub(super) fn classify(success: bool, body: Value, country: &str) -> Result<WyreQuote, ExchangeError> {
    if !success || is_error_reply(&body) {
        return Err(provider_error(&body, country));
    }

    serde_json::from_value(body).map_err(|e| ExchangeError::MalformedQuote {
        provider: ProviderKey::Wyre,
        detail: e.to_string(),
    })
}

pub(super) async fn fetch(provider: &WyreProvider, request: &OfferRequest) -> Result<ProviderQuote, ExchangeError> {
    let address = provider.addresses.create_address(&request.wallet).await?;
    let dest = with_protocol_prefix(&address, &request.coin, request.wallet.network)?;

    let body = quotation_body(request, &dest, provider.env.provider_env());
    let response = provider.client.post_service(QUOTATION_PATH, &body).await?;

    let wyre = classify(response.is_success(), response.body, &request.country)?;
    let raw = ProviderQuoteResponse::Wyre(wyre);
    let quote = raw.normalize(&request.coin)?;

    Ok(ProviderQuote { quote, raw })
}
