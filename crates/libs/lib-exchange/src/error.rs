//! # Exchange Errors
//!
//! Every failure a quote fetch or a provider checkout can end with. The `Display`
//! text of each variant except [`ExchangeError::Transport`] is already
//! user-facing; use [`ExchangeError::user_message`] when showing any of them.

use lib_core::{AppError, ProviderKey};
use thiserror::Error;

/// Fallback shown when nothing more specific is known.
pub const GENERIC_OFFER_ERROR: &str = "Could not get crypto offer. Please, try again later.";

/// Shown when the provider answered without a usable quote.
pub const RATES_UNAVAILABLE: &str = "Can't get rates at this moment. Please try again later";

/// Coarse classification used for logging and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Expected rejection (amount outside the provider's limits). Not a failure.
    PolicyRejection,
    /// Structured provider error with a user-facing message.
    ProviderValidation,
    /// Network, HTTP or collaborator failure.
    Transport,
    /// Provider returned data that cannot be right (negative fee, id mismatch).
    DataIntegrity,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExchangeError {
    #[error("There are no {provider} offers available, as the current purchase limits for this exchange must be between {min} {currency} and {max} {currency}")]
    OutOfLimits {
        provider: ProviderKey,
        min: f64,
        max: f64,
        currency: String,
    },

    #[error("{message}")]
    Provider {
        provider: ProviderKey,
        code: Option<String>,
        message: String,
    },

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("The response does not match the origin of the request")]
    CorrelationMismatch {
        expected: String,
        received: Option<String>,
    },

    #[error("{provider} has returned a wrong value for the fee. Fee: {fee}")]
    NegativeFee { provider: ProviderKey, fee: f64 },

    #[error("{provider} returned an invalid quote: {detail}")]
    MalformedQuote { provider: ProviderKey, detail: String },

    #[error("{0}")]
    Address(String),
}

impl ExchangeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExchangeError::OutOfLimits { .. } => ErrorKind::PolicyRejection,
            ExchangeError::Provider { .. } | ExchangeError::Unsupported(_) => ErrorKind::ProviderValidation,
            ExchangeError::Transport(_) | ExchangeError::Address(_) => ErrorKind::Transport,
            ExchangeError::CorrelationMismatch { .. }
            | ExchangeError::NegativeFee { .. }
            | ExchangeError::MalformedQuote { .. } => ErrorKind::DataIntegrity,
        }
    }

    pub fn is_policy_rejection(&self) -> bool {
        self.kind() == ErrorKind::PolicyRejection
    }

    /// Message suitable for the offer card or the error modal.
    pub fn user_message(&self) -> String {
        match self {
            ExchangeError::Transport(_) => GENERIC_OFFER_ERROR.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        ExchangeError::Transport(err.to_string())
    }
}

impl From<ExchangeError> for AppError {
    fn from(err: ExchangeError) -> Self {
        match err.kind() {
            ErrorKind::PolicyRejection => AppError::InvalidInput(err.user_message()),
            _ => AppError::Provider(err.user_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_limits_message() {
        let err = ExchangeError::OutOfLimits {
            provider: ProviderKey::Simplex,
            min: 50.0,
            max: 20_000.0,
            currency: "USD".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "There are no Simplex offers available, as the current purchase limits for this exchange must be between 50 USD and 20000 USD"
        );
        assert!(err.is_policy_rejection());
    }

    #[test]
    fn test_transport_is_hidden_behind_generic_message() {
        let err = ExchangeError::Transport("connection reset by peer".to_string());
        assert_eq!(err.user_message(), GENERIC_OFFER_ERROR);
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_negative_fee_message() {
        let err = ExchangeError::NegativeFee { provider: ProviderKey::Wyre, fee: -1.5 };
        assert_eq!(err.user_message(), "Wyre has returned a wrong value for the fee. Fee: -1.5");
        assert_eq!(err.kind(), ErrorKind::DataIntegrity);
    }

    #[test]
    fn test_app_error_conversion() {
        let err: AppError = ExchangeError::Provider {
            provider: ProviderKey::Wyre,
            code: Some("validation.unsupportedCountry".to_string()),
            message: "Country not supported: CU".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Provider(ref m) if m == "Country not supported: CU"));
    }
}
