//! # Validation Utilities
//!
//! Input validation helpers.

/// Validate that a string is not empty.
pub fn validate_not_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate that an amount is a finite number greater than zero.
pub fn validate_positive_amount(amount: f64, field_name: &str) -> Result<(), String> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(format!("{} must be a positive number", field_name))
    }
}

/// Validate an ISO 4217 style currency code (three ASCII letters, any case).
pub fn validate_currency_code(code: &str) -> Result<(), String> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(format!("Invalid currency code: {}", code))
    }
}

/// Validate an ISO 3166 alpha-2 country code (two ASCII letters, any case).
pub fn validate_country_code(code: &str) -> Result<(), String> {
    let code = code.trim();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(format!("Invalid country code: {}", code))
    }
}

/// Validate an opaque identifier: 1-128 ASCII letters, digits, `-` or `_`.
pub fn validate_identifier(value: &str, field_name: &str) -> Result<(), String> {
    let valid = !value.is_empty()
        && value.len() <= 128
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(format!("Invalid {}: only letters, digits, '-' and '_' are allowed", field_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_empty() {
        assert!(validate_not_empty("btc", "coin").is_ok());
        assert_eq!(validate_not_empty("  ", "coin").unwrap_err(), "coin cannot be empty");
    }

    #[test]
    fn test_positive_amount() {
        assert!(validate_positive_amount(0.01, "amount").is_ok());
        assert!(validate_positive_amount(0.0, "amount").is_err());
        assert!(validate_positive_amount(-5.0, "amount").is_err());
        assert!(validate_positive_amount(f64::NAN, "amount").is_err());
    }

    #[test]
    fn test_codes() {
        assert!(validate_currency_code("usd").is_ok());
        assert!(validate_currency_code("US").is_err());
        assert!(validate_country_code("US").is_ok());
        assert!(validate_country_code("USA").is_err());
    }

    #[test]
    fn test_identifier() {
        assert!(validate_identifier("9f1c2a7e-0b7d-4c55-a6f0-0c3d1e2f4a5b", "wallet id").is_ok());
        assert!(validate_identifier("wallet_1", "wallet id").is_ok());
        assert!(validate_identifier("", "wallet id").is_err());
        assert!(validate_identifier("../service", "wallet id").is_err());
        assert!(validate_identifier("w1&success=true", "wallet id").is_err());
        assert!(validate_identifier("w1#frag", "wallet id").is_err());
    }
}
