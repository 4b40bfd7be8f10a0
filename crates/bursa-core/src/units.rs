//! Arbitrary-precision amount parsing and delta formatting.
//!
//! Balances and transfer values cross every API boundary in this workspace
//! as decimal or `0x`-prefixed hex strings, never as fixed-width numerics -
//! a chain balance can exceed 64 bits. This module is the single place that
//! turns those strings into [`U256`] and back.
//!
//! # Example
//!
//! ```rust
//! use bursa_core::units::{parse_amount, format_credit, format_debit};
//! use alloy_primitives::U256;
//!
//! assert_eq!(parse_amount("256").unwrap(), U256::from(256u64));
//! assert_eq!(parse_amount("0x100").unwrap(), U256::from(256u64));
//! assert_eq!(format_credit(U256::from(256u64)), "+256");
//! assert_eq!(format_debit(U256::from(256u64)), "-256");
//! ```

use alloy_primitives::U256;

/// A string that could not be parsed as a non-negative integer amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a non-negative integer amount: {input:?}")]
pub struct AmountParseError {
    /// The rejected input, truncated for display.
    pub input: String,
}

impl AmountParseError {
    fn new(input: &str) -> Self {
        // Cap what we echo back; a malformed amount may be arbitrarily long.
        let mut input = input.to_string();
        input.truncate(64);
        Self { input }
    }
}

/// Parse a decimal or `0x`-prefixed hex string into a [`U256`].
///
/// Rejects empty input, signs, whitespace-only strings, a bare `0x`, and any
/// non-digit characters. Parsing failure is always an error - an amount is
/// never silently defaulted to zero.
///
/// # Errors
///
/// Returns [`AmountParseError`] when the input is not a non-negative integer
/// in either encoding.
pub fn parse_amount(input: &str) -> Result<U256, AmountParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountParseError::new(input));
    }

    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AmountParseError::new(input));
        }
        return U256::from_str_radix(hex, 16).map_err(|_| AmountParseError::new(input));
    }

    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(AmountParseError::new(input));
    }
    U256::from_str_radix(trimmed, 10).map_err(|_| AmountParseError::new(input))
}

/// Format an amount as a `+`-prefixed credit delta in decimal.
#[must_use]
pub fn format_credit(amount: U256) -> String {
    format!("+{amount}")
}

/// Format an amount as a `-`-prefixed debit delta in decimal.
#[must_use]
pub fn format_debit(amount: U256) -> String {
    format!("-{amount}")
}
