//! # Utilities Library
//!
//! Shared utility functions for environment variables, time, and input validation.

pub mod envs;
pub mod time;
pub mod validation;

// Re-export commonly used functions
pub use envs::{get_env, get_env_or, get_env_parse};
pub use time::{now_utc, format_time};
pub use validation::{validate_identifier, validate_not_empty, validate_positive_amount, validate_currency_code, validate_country_code};
