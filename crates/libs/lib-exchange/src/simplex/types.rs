//! Simplex wire types, as relayed by the wallet service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// region: --- Quote

#[derive(Debug, Clone, Serialize)]
pub struct SimplexQuoteBody {
    pub digital_currency: String,
    pub fiat_currency: String,
    pub requested_currency: String,
    pub requested_amount: f64,
    pub end_user_id: String,
    pub payment_methods: Vec<String>,
    pub env: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplexQuote {
    pub quote_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub digital_money: SimplexDigitalMoney,
    pub fiat_money: SimplexFiatMoney,
    #[serde(default)]
    pub valid_until: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplexDigitalMoney {
    pub currency: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplexFiatMoney {
    pub currency: String,
    pub base_amount: f64,
    pub total_amount: f64,
}

// endregion: --- Quote

// region: --- Payment Request

#[derive(Debug, Clone, Serialize)]
pub struct SimplexPaymentRequestBody {
    pub account_details: AccountDetails,
    pub transaction_details: TransactionDetails,
    pub env: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountDetails {
    pub app_end_user_id: String,
    pub app_install_date: String,
    pub app_version_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetails {
    pub payment_details: PaymentDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentDetails {
    pub quote_id: String,
    pub payment_id: String,
    pub order_id: String,
    pub destination_wallet: DestinationWallet,
    pub original_http_ref_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DestinationWallet {
    pub currency: String,
    pub address: String,
}

/// Reply to a payment request; the ids are the ones this client generated.
#[derive(Debug, Clone, Deserialize)]
pub struct SimplexPaymentReply {
    pub api_host: Option<String>,
    pub app_provider_id: Option<String>,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
}

// endregion: --- Payment Request

/// Pick the user-facing message out of a Simplex error reply.
///
/// Priority: `error` string, nested `error.error`, top-level `message`.
pub fn error_message(body: &Value) -> Option<String> {
    match body.get("error") {
        Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        Some(Value::Object(inner)) => {
            if let Some(Value::String(s)) = inner.get("error") {
                if !s.is_empty() {
                    return Some(s.clone());
                }
            }
        }
        _ => {}
    }

    body.get("message")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_priority() {
        assert_eq!(error_message(&json!({"error": "flat", "message": "m"})), Some("flat".to_string()));
        assert_eq!(
            error_message(&json!({"error": {"error": "nested"}, "message": "m"})),
            Some("nested".to_string())
        );
        assert_eq!(error_message(&json!({"error": {}, "message": "m"})), Some("m".to_string()));
        assert_eq!(error_message(&json!({"quote_id": "q"})), None);
    }
}
