use super::types::{
    error_message, AccountDetails, DestinationWallet, PaymentDetails, SimplexPaymentReply, SimplexPaymentRequestBody,
    SimplexQuote, TransactionDetails,
};
use super::SimplexProvider;
use crate::error::{ExchangeError, GENERIC_OFFER_ERROR};
use crate::provider::CheckoutTicket;
use crate::request::OfferRequest;
use lib_core::model::store::NewPendingPayment;
use lib_core::ProviderKey;
use lib_utils::{format_time, now_utc};
use reqwest::Url;
use tracing::debug;
use uuid::Uuid;

pub(super) const PAYMENT_REQUEST_PATH: &str = "/v1/service/simplex/paymentRequest";
const REFERRER_URL: &str = "https://bitpay.com/";

/// Ids generated for one payment request.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct PaymentIds {
    pub order_id: String,
    pub payment_id: String,
}

impl PaymentIds {
    pub(super) fn generate() -> Self {
        Self {
            order_id: Uuid::new_v4().to_string(),
            payment_id: Uuid::new_v4().to_string(),
        }
    }
}

pub(super) fn payment_request_body(
    request: &OfferRequest,
    quote: &SimplexQuote,
    address: &str,
    ids: &PaymentIds,
    env: &str,
) -> SimplexPaymentRequestBody {
    let install_date = request.wallet.created_on.unwrap_or_else(now_utc);

    SimplexPaymentRequestBody {
        account_details: AccountDetails {
            app_end_user_id: request.wallet.id.clone(),
            app_install_date: format_time(install_date),
            app_version_id: env!("CARGO_PKG_VERSION").to_string(),
        },
        transaction_details: TransactionDetails {
            payment_details: PaymentDetails {
                quote_id: quote.quote_id.clone(),
                payment_id: ids.payment_id.clone(),
                order_id: ids.order_id.clone(),
                destination_wallet: DestinationWallet {
                    currency: request.coin.to_uppercase(),
                    address: address.to_string(),
                },
                original_http_ref_url: REFERRER_URL.to_string(),
            },
        },
        env: env.to_string(),
    }
}

/// Everything the Simplex redirect page needs to resume the checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectParams<'a> {
    pub api_host: &'a str,
    pub partner: &'a str,
    pub app_scheme: &'a str,
    pub quote_id: &'a str,
    pub payment_id: &'a str,
    pub user_id: &'a str,
    pub address: &'a str,
    pub coin: &'a str,
    pub fiat_total_amount: f64,
    pub fiat_currency: &'a str,
    pub crypto_amount: f64,
}

/// Deep link Simplex sends the user back to, carrying the payment outcome.
fn return_url(params: &RedirectParams<'_>, success: bool) -> Result<String, ExchangeError> {
    let success = success.to_string();
    let url = Url::parse_with_params(
        &format!("{}://simplex", params.app_scheme),
        &[
            ("success", success.as_str()),
            ("paymentId", params.payment_id),
            ("quoteId", params.quote_id),
            ("userId", params.user_id),
        ],
    )
    .map_err(|e| ExchangeError::Transport(format!("Invalid Simplex return URL: {}", e)))?;

    Ok(url.to_string())
}

/// Build the URL of the wallet service's Simplex redirect page.
pub fn payment_url(service_base_url: &str, params: &RedirectParams<'_>) -> Result<String, ExchangeError> {
    let base = Url::parse(service_base_url)
        .map_err(|e| ExchangeError::Transport(format!("Invalid wallet service URL: {}", e)))?;
    let page = format!("{}/static/simplex-redirect.html", base.origin().ascii_serialization());

    let success_url = return_url(params, true)?;
    let fail_url = return_url(params, false)?;
    let coin = params.coin.to_uppercase();
    let fiat_total = params.fiat_total_amount.to_string();
    let crypto_total = params.crypto_amount.to_string();

    let query = [
        ("api_host", params.api_host),
        ("version", "1"),
        ("partner", params.partner),
        ("payment_flow_type", "wallet"),
        ("return_url_success", success_url.as_str()),
        ("return_url_fail", fail_url.as_str()),
        ("quote_id", params.quote_id),
        ("payment_id", params.payment_id),
        ("user_id", params.user_id),
        ("destination_wallet[address]", params.address),
        ("destination_wallet[currency]", coin.as_str()),
        ("fiat_total_amount[amount]", fiat_total.as_str()),
        ("fiat_total_amount[currency]", params.fiat_currency),
        ("digital_total_amount[amount]", crypto_total.as_str()),
        ("digital_total_amount[currency]", coin.as_str()),
    ];

    let url = Url::parse_with_params(&page, &query)
        .map_err(|e| ExchangeError::Transport(format!("Invalid Simplex redirect URL: {}", e)))?;

    Ok(url.to_string())
}

/// The reply may omit the generated ids, but must not swap them.
fn verify_echoed_id(expected: &str, received: Option<&str>) -> Result<(), ExchangeError> {
    match received {
        Some(received) if received != expected => Err(ExchangeError::CorrelationMismatch {
            expected: expected.to_string(),
            received: Some(received.to_string()),
        }),
        _ => Ok(()),
    }
}

pub(super) async fn checkout(
    provider: &SimplexProvider,
    request: &OfferRequest,
    quote: &SimplexQuote,
    address: &str,
) -> Result<CheckoutTicket, ExchangeError> {
    let ids = PaymentIds::generate();
    let body = payment_request_body(request, quote, address, &ids, provider.env.provider_env());

    let response = provider.client.post_service(PAYMENT_REQUEST_PATH, &body).await?;

    if let Some(message) = error_message(&response.body) {
        return Err(ExchangeError::Provider { provider: ProviderKey::Simplex, code: None, message });
    }
    if !response.is_success() {
        return Err(ExchangeError::Provider {
            provider: ProviderKey::Simplex,
            code: Some(response.status.as_u16().to_string()),
            message: GENERIC_OFFER_ERROR.to_string(),
        });
    }

    let reply: SimplexPaymentReply = serde_json::from_value(response.body).map_err(|e| {
        ExchangeError::MalformedQuote { provider: ProviderKey::Simplex, detail: e.to_string() }
    })?;
    verify_echoed_id(&ids.order_id, reply.order_id.as_deref())?;
    verify_echoed_id(&ids.payment_id, reply.payment_id.as_deref())?;
    let (Some(api_host), Some(partner)) = (reply.api_host, reply.app_provider_id) else {
        return Err(ExchangeError::MalformedQuote {
            provider: ProviderKey::Simplex,
            detail: "payment request reply without api_host or app_provider_id".to_string(),
        });
    };
    debug!(order_id = %ids.order_id, "Simplex payment request created");

    let redirect_url = payment_url(
        provider.client.base_url(),
        &RedirectParams {
            api_host: &api_host,
            partner: &partner,
            app_scheme: &provider.app_scheme,
            quote_id: &quote.quote_id,
            payment_id: &ids.payment_id,
            user_id: &request.wallet.id,
            address,
            coin: &request.coin,
            fiat_total_amount: quote.fiat_money.total_amount,
            fiat_currency: &request.fiat_currency,
            crypto_amount: quote.digital_money.amount,
        },
    )?;

    let payment = NewPendingPayment {
        env: provider.env,
        provider: ProviderKey::Simplex,
        order_id: ids.order_id,
        payment_id: Some(ids.payment_id),
        address: address.to_string(),
        coin: request.coin.to_uppercase(),
        crypto_amount: quote.digital_money.amount,
        fiat_base_amount: quote.fiat_money.base_amount,
        fiat_total_amount: quote.fiat_money.total_amount,
        fiat_total_amount_currency: request.fiat_currency.clone(),
        user_id: request.wallet.id.clone(),
    };

    Ok(CheckoutTicket { redirect_url, payment })
}
