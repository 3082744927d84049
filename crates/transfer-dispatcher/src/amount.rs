//! Fixed-point token amounts.
//!
//! Operator input is decimal text. It is validated without knowing the asset and only scaled to
//! base units (`U256`) once the asset's decimals are known. No floating point is involved.

use ethers::types::U256;
use ethers::utils::{format_units, parse_units};

use crate::error::ConfigError;

/// Checks that `amount` is a plain positive decimal number and returns it trimmed.
pub fn validate(amount: &str) -> Result<String, ConfigError> {
    let trimmed = amount.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return Err(ConfigError::InvalidAmount(amount.to_string())),
        }
    }
    if !seen_digit {
        return Err(ConfigError::InvalidAmount(amount.to_string()));
    }

    let is_zero = digits.chars().all(|c| c == '0' || c == '.');
    if negative || is_zero {
        return Err(ConfigError::NonPositiveAmount);
    }

    Ok(trimmed.to_string())
}

/// Scales a validated amount to base units. Digits beyond `decimals` are truncated; an amount
/// that truncates to zero is rejected.
pub fn scale(amount: &str, decimals: u8) -> Result<U256, ConfigError> {
    let amount = validate(amount)?;
    let units: U256 = parse_units(amount.as_str(), u32::from(decimals))
        .map_err(|e| ConfigError::InvalidAmount(e.to_string()))?
        .into();
    if units.is_zero() {
        return Err(ConfigError::AmountBelowPrecision { amount, decimals });
    }
    Ok(units)
}

/// `amount * count`, saturating at `U256::MAX`.
pub fn total(amount: U256, count: u32) -> U256 {
    amount.saturating_mul(U256::from(count))
}

/// Human readable form of a base-unit amount, without trailing zeros.
pub fn format(units: U256, decimals: u8) -> String {
    let Ok(text) = format_units(units, u32::from(decimals)) else {
        return units.to_string();
    };
    match text.split_once('.') {
        Some((int, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                int.to_string()
            } else {
                format!("{int}.{frac}")
            }
        }
        None => text,
    }
}
