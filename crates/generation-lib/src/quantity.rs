//! Kubernetes resource quantity parsing
//!
//! Supports the binary (`Ki`..`Ei`) and decimal (`n`..`E`) suffixes as well as
//! decimal exponents (`1e3`).

use crate::error::{GenerationError, Result};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

const BINARY_SUFFIXES: &[(&str, f64)] = &[
    ("Ki", 1024.0),
    ("Mi", 1048576.0),
    ("Gi", 1073741824.0),
    ("Ti", 1099511627776.0),
    ("Pi", 1125899906842624.0),
    ("Ei", 1152921504606846976.0),
];

const DECIMAL_SUFFIXES: &[(&str, f64)] = &[
    ("n", 1e-9),
    ("u", 1e-6),
    ("m", 1e-3),
    ("", 1.0),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
    ("E", 1e18),
];

/// Parse a quantity string into its numeric value in base units
pub fn parse_quantity(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let invalid = || GenerationError::InvalidQuantity(text.to_string());

    let split = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '+' || *c == '-'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);
    if number.is_empty() || number == "+" || number == "-" {
        return Err(invalid());
    }
    let number: f64 = number.parse().map_err(|_| invalid())?;

    Ok(number * multiplier(suffix).ok_or_else(invalid)?)
}

fn multiplier(suffix: &str) -> Option<f64> {
    if let Some((_, m)) = BINARY_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
        return Some(*m);
    }
    if let Some((_, m)) = DECIMAL_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
        return Some(*m);
    }

    // Decimal exponent, e.g. "1e3" or "5E-2"
    let exponent = suffix
        .strip_prefix('e')
        .or_else(|| suffix.strip_prefix('E'))?;
    let exponent: i32 = exponent.parse().ok()?;
    Some(10f64.powi(exponent))
}

/// Value of the quantity in base units, rounded up to the next integer
pub fn quantity_value(quantity: &Quantity) -> Result<i64> {
    Ok(round_up(parse_quantity(&quantity.0)?))
}

/// Value of the quantity in thousandths of the base unit, rounded up
pub fn quantity_milli_value(quantity: &Quantity) -> Result<i64> {
    Ok(round_up(parse_quantity(&quantity.0)? * 1000.0))
}

// Suffix multipliers are inexact in binary floating point; values within
// rounding noise of an integer are not pushed to the next one.
fn round_up(value: f64) -> i64 {
    let nearest = value.round();
    if (value - nearest).abs() < 1e-6 {
        nearest as i64
    } else {
        value.ceil() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> Quantity {
        Quantity(s.to_string())
    }

    #[test]
    fn test_plain_and_decimal_suffixes() {
        assert_eq!(quantity_value(&q("17")).unwrap(), 17);
        assert_eq!(quantity_value(&q("2k")).unwrap(), 2000);
        assert_eq!(quantity_value(&q("1G")).unwrap(), 1_000_000_000);
        assert_eq!(quantity_milli_value(&q("250m")).unwrap(), 250);
    }

    #[test]
    fn test_value_rounds_up() {
        assert_eq!(quantity_value(&q("500m")).unwrap(), 1);
        assert_eq!(quantity_value(&q("1.2")).unwrap(), 2);
    }

    #[test]
    fn test_binary_suffixes() {
        assert_eq!(quantity_value(&q("1Ki")).unwrap(), 1024);
        assert_eq!(quantity_value(&q("128Mi")).unwrap(), 134_217_728);
        assert_eq!(quantity_value(&q("1Gi")).unwrap(), 1_073_741_824);
    }

    #[test]
    fn test_exponent() {
        assert_eq!(quantity_value(&q("1e3")).unwrap(), 1000);
        assert_eq!(quantity_milli_value(&q("5E-1")).unwrap(), 500);
    }

    #[test]
    fn test_invalid_quantities() {
        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("abc").is_err());
        assert!(parse_quantity("12Qi").is_err());
        assert!(parse_quantity("-").is_err());
    }
}
