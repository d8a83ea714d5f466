//! Kubernetes resource quantity parsing.

use crate::error::{CloudConfigError, Result};

const BINARY_SUFFIXES: [(&str, u32); 6] = [("Ki", 1), ("Mi", 2), ("Gi", 3), ("Ti", 4), ("Pi", 5), ("Ei", 6)];
const DECIMAL_SUFFIXES: [(&str, u32); 6] = [("k", 1), ("M", 2), ("G", 3), ("T", 4), ("P", 5), ("E", 6)];

/// Parses a quantity such as `50Gi`, `1.5G`, `1e3` or `1024` into a byte
/// count, rounding fractional results up.
pub fn parse_bytes(quantity: &str) -> Result<u128> {
    let invalid = || CloudConfigError::InvalidQuantity(quantity.to_string());

    let q = quantity.trim();
    if q.is_empty() {
        return Err(invalid());
    }

    let (number, multiplier) = split_suffix(q).ok_or_else(invalid)?;
    let (int_part, frac_part) = match number.split_once('.') {
        Some((i, f)) => (i, f),
        None => (number, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let digits = format!("{int_part}{frac_part}");
    let mantissa: u128 = digits.parse().map_err(|_| invalid())?;
    let scale = 10u128
        .checked_pow(u32::try_from(frac_part.len()).map_err(|_| invalid())?)
        .ok_or_else(invalid)?;
    let scaled = mantissa.checked_mul(multiplier).ok_or_else(invalid)?;

    Ok(scaled.div_ceil(scale))
}

fn split_suffix(q: &str) -> Option<(&str, u128)> {
    for (suffix, power) in BINARY_SUFFIXES {
        if let Some(number) = q.strip_suffix(suffix) {
            return Some((number, 1024u128.checked_pow(power)?));
        }
    }
    for (suffix, power) in DECIMAL_SUFFIXES {
        if let Some(number) = q.strip_suffix(suffix) {
            return Some((number, 1000u128.checked_pow(power)?));
        }
    }
    if let Some((number, exponent)) = q.split_once(['e', 'E']) {
        let exponent: u32 = exponent.parse().ok()?;
        return Some((number, 10u128.checked_pow(exponent)?));
    }
    Some((q, 1))
}
