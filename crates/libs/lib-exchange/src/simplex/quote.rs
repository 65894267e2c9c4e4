use super::types::{error_message, SimplexQuote, SimplexQuoteBody};
use super::SimplexProvider;
use crate::error::{ExchangeError, GENERIC_OFFER_ERROR, RATES_UNAVAILABLE};
use crate::provider::{ProviderQuote, ProviderQuoteResponse};
use crate::request::OfferRequest;
use lib_core::{PaymentMethod, ProviderKey};
use serde_json::Value;

pub(super) const QUOTE_PATH: &str = "/v1/service/simplex/quote";

pub(super) fn quote_body(request: &OfferRequest, env: &str) -> SimplexQuoteBody {
    let payment_method = match request.payment_method {
        PaymentMethod::SepaBankTransfer => "simplex_account",
        _ => "credit_card",
    };

    SimplexQuoteBody {
        digital_currency: request.coin.to_uppercase(),
        fiat_currency: request.fiat_currency.clone(),
        requested_currency: request.fiat_currency.clone(),
        requested_amount: request.amount,
        end_user_id: request.wallet.id.clone(),
        payment_methods: vec![payment_method.to_string()],
        env: env.to_string(),
    }
}

/// Turn a proxy reply into a Simplex quote or a provider error.
pub(super) fn classify(success: bool, body: Value) -> Result<SimplexQuote, ExchangeError> {
    let has_quote = body.get("quote_id").is_some_and(|id| !id.is_null());

    if success && has_quote {
        return serde_json::from_value(body).map_err(|e| ExchangeError::MalformedQuote {
            provider: ProviderKey::Simplex,
            detail: e.to_string(),
        });
    }

    // A 2xx reply without a quote always reads as missing rates.
    let message = if success {
        RATES_UNAVAILABLE.to_string()
    } else {
        error_message(&body).unwrap_or_else(|| GENERIC_OFFER_ERROR.to_string())
    };

    Err(ExchangeError::Provider {
        provider: ProviderKey::Simplex,
        code: None,
        message,
    })
}

pub(super) async fn fetch(provider: &SimplexProvider, request: &OfferRequest) -> Result<ProviderQuote, ExchangeError> {
    let body = quote_body(request, provider.env.provider_env());
    let response = provider.client.post_service(QUOTE_PATH, &body).await?;

    let simplex = classify(response.is_success(), response.body)?;
    let raw = ProviderQuoteResponse::Simplex(simplex);
    let quote = raw.normalize(&request.coin)?;

    Ok(ProviderQuote { quote, raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::tests::usd_btc_request;
    use serde_json::json;

    #[test]
    fn test_payment_methods_field() {
        let request = usd_btc_request(100.0, PaymentMethod::CreditCard);
        assert_eq!(quote_body(&request, "production").payment_methods, vec!["credit_card"]);

        let mut sepa = request.clone();
        sepa.payment_method = PaymentMethod::SepaBankTransfer;
        assert_eq!(quote_body(&sepa, "production").payment_methods, vec!["simplex_account"]);
    }

    #[test]
    fn test_reply_without_quote_id() {
        let err = classify(true, json!({"id": "abc"})).unwrap_err();
        assert_eq!(err.user_message(), RATES_UNAVAILABLE);

        let err = classify(true, json!({"id": "abc", "error": "Quote expired"})).unwrap_err();
        assert_eq!(err.user_message(), RATES_UNAVAILABLE);

        let err = classify(true, json!({"id": "abc", "message": "try later"})).unwrap_err();
        assert_eq!(err.user_message(), RATES_UNAVAILABLE);
    }

    #[test]
    fn test_error_reply_uses_provider_message() {
        let err = classify(false, json!({"error": {"error": "Amount too small"}})).unwrap_err();
        assert_eq!(err.user_message(), "Amount too small");

        let err = classify(false, json!({})).unwrap_err();
        assert_eq!(err.user_message(), GENERIC_OFFER_ERROR);
    }
}
