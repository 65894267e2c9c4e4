//! Wyre wire types, as relayed by the wallet service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNSUPPORTED_COUNTRY_CODE: &str = "validation.unsupportedCountry";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WyreQuotationBody {
    /// Sent as a string, the way Wyre's API expects amounts
    pub source_amount: String,
    pub source_currency: String,
    pub dest_currency: String,
    /// `<protocol-prefix>:<address>`
    pub dest: String,
    pub country: String,
    pub amount_include_fees: bool,
    pub wallet_type: String,
    pub env: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WyreQuote {
    pub source_currency: String,
    pub source_amount: f64,
    pub source_amount_without_fees: f64,
    pub dest_currency: String,
    pub dest_amount: f64,
    #[serde(default)]
    pub exchange_rate: Option<f64>,
    #[serde(default)]
    pub fees: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WyreReservationBody {
    pub source_amount: String,
    pub dest: String,
    pub dest_currency: String,
    pub lock_fields: Vec<String>,
    pub payment_method: String,
    pub source_currency: String,
    pub country: String,
    pub amount_include_fees: bool,
    pub redirect_url: String,
    pub failure_redirect_url: String,
    pub env: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WyreReservationReply {
    pub url: Option<String>,
    pub reservation: Option<String>,
}

/// Whether a reply is a Wyre error object.
pub fn is_error_reply(body: &Value) -> bool {
    body.get("exceptionId").is_some_and(|v| !v.is_null()) || body.get("error").is_some_and(|v| !v.is_null())
}

/// `(errorCode, message)` of a Wyre error object.
pub fn error_parts(body: &Value) -> (Option<String>, Option<String>) {
    let text = |key: &str| {
        body.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let message = text("message").or_else(|| text("error"));
    (text("errorCode"), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_detection() {
        assert!(is_error_reply(&json!({"exceptionId": "X-1", "message": "nope"})));
        assert!(is_error_reply(&json!({"error": "boom"})));
        assert!(!is_error_reply(&json!({"destAmount": 0.002, "error": null})));
    }

    #[test]
    fn test_error_parts() {
        let (code, message) = error_parts(&json!({"errorCode": "limits.exceeded", "message": "Too much"}));
        assert_eq!(code.as_deref(), Some("limits.exceeded"));
        assert_eq!(message.as_deref(), Some("Too much"));
    }
}
