use super::quote::provider_error;
use super::types::{is_error_reply, WyreQuote, WyreReservationBody, WyreReservationReply};
use super::WyreProvider;
use crate::coins::with_protocol_prefix;
use crate::error::ExchangeError;
use crate::provider::CheckoutTicket;
use crate::request::OfferRequest;
use lib_core::model::store::NewPendingPayment;
use lib_core::{PaymentMethod, ProviderKey};
use reqwest::Url;
use tracing::debug;
use uuid::Uuid;

pub(super) const RESERVATION_PATH: &str = "/v1/service/wyre/walletOrderReservation";

/// Deep link Wyre sends the user back to after a completed order.
pub fn redirect_url(app_scheme: &str, wallet_id: &str, dest_amount: f64) -> Result<String, ExchangeError> {
    let dest_amount = dest_amount.to_string();
    let url = Url::parse_with_params(
        &format!("{}://wyre", app_scheme),
        &[("walletId", wallet_id), ("destAmount", dest_amount.as_str())],
    )
    .map_err(|e| ExchangeError::Transport(format!("Invalid Wyre redirect URL: {}", e)))?;

    Ok(url.to_string())
}

pub fn failure_redirect_url(app_scheme: &str) -> String {
    format!("{}://wyreError", app_scheme)
}

pub(super) fn reservation_body(
    request: &OfferRequest,
    quote: &WyreQuote,
    dest: &str,
    app_scheme: &str,
    env: &str,
) -> Result<WyreReservationBody, ExchangeError> {
    let payment_method = match request.payment_method {
        PaymentMethod::ApplePay => "apple-pay",
        _ => "debit-card",
    };

    Ok(WyreReservationBody {
        source_amount: request.amount.to_string(),
        dest: dest.to_string(),
        dest_currency: request.coin.to_uppercase(),
        lock_fields: vec!["dest".to_string(), "destCurrency".to_string(), "country".to_string()],
        payment_method: payment_method.to_string(),
        source_currency: request.fiat_currency.clone(),
        country: request.country.clone(),
        amount_include_fees: true,
        redirect_url: redirect_url(app_scheme, &request.wallet.id, quote.dest_amount)?,
        failure_redirect_url: failure_redirect_url(app_scheme),
        env: env.to_string(),
    })
}

pub(super) async fn checkout(
    provider: &WyreProvider,
    request: &OfferRequest,
    quote: &WyreQuote,
    address: &str,
) -> Result<CheckoutTicket, ExchangeError> {
    let dest = with_protocol_prefix(address, &request.coin, request.wallet.network)?;
    let body = reservation_body(request, quote, &dest, &provider.app_scheme, provider.env.provider_env())?;

    let response = provider.client.post_service(RESERVATION_PATH, &body).await?;
    if !response.is_success() || is_error_reply(&response.body) {
        return Err(provider_error(&response.body, &request.country));
    }

    let reply: WyreReservationReply = serde_json::from_value(response.body).map_err(|e| {
        ExchangeError::MalformedQuote { provider: ProviderKey::Wyre, detail: e.to_string() }
    })?;
    let Some(url) = reply.url.filter(|u| !u.is_empty()) else {
        return Err(ExchangeError::MalformedQuote {
            provider: ProviderKey::Wyre,
            detail: "reservation reply without url".to_string(),
        });
    };

    let order_id = reply.reservation.unwrap_or_else(|| Uuid::new_v4().to_string());
    debug!(order_id = %order_id, "Wyre order reserved");

    let payment = NewPendingPayment {
        env: provider.env,
        provider: ProviderKey::Wyre,
        order_id,
        payment_id: None,
        address: address.to_string(),
        coin: request.coin.to_uppercase(),
        crypto_amount: quote.dest_amount,
        fiat_base_amount: quote.source_amount_without_fees,
        fiat_total_amount: quote.source_amount,
        fiat_total_amount_currency: request.fiat_currency.clone(),
        user_id: request.wallet.id.clone(),
    };

    Ok(CheckoutTicket { redirect_url: url, payment })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::tests::usd_btc_request;

    #[test]
    fn test_redirect_urls() {
        assert_eq!(
            redirect_url("bitpay", "wallet-1", 0.002).unwrap(),
            "bitpay://wyre?walletId=wallet-1&destAmount=0.002"
        );
        assert_eq!(failure_redirect_url("bitpay"), "bitpay://wyreError");
    }

    #[test]
    fn test_redirect_url_keeps_wallet_id_in_one_param() {
        let url = redirect_url("bitpay", "w1&destAmount=999#x", 0.002).unwrap();
        let parsed = Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();

        assert_eq!(
            pairs,
            vec![
                ("walletId".to_string(), "w1&destAmount=999#x".to_string()),
                ("destAmount".to_string(), "0.002".to_string()),
            ]
        );
        assert_eq!(parsed.fragment(), None);
    }

    #[test]
    fn test_reservation_body_locks_destination() {
        let request = usd_btc_request(100.0, PaymentMethod::ApplePay);
        let quote = WyreQuote {
            source_currency: "USD".to_string(),
            source_amount: 100.0,
            source_amount_without_fees: 96.0,
            dest_currency: "BTC".to_string(),
            dest_amount: 0.00192,
            exchange_rate: None,
            fees: None,
        };

        let body = reservation_body(&request, &quote, "bitcoin:1Boat", "bitpay", "sandbox").unwrap();

        assert_eq!(body.lock_fields, vec!["dest", "destCurrency", "country"]);
        assert_eq!(body.payment_method, "apple-pay");
        assert_eq!(body.dest, "bitcoin:1Boat");
        assert_eq!(body.redirect_url, "bitpay://wyre?walletId=wallet-1&destAmount=0.00192");
    }
}
