//! Utility functions and helpers

pub mod decimal_u128;
mod time;

pub use time::{duration_since, format_timestamp};

use crate::{types::DECIMALS, Error, Result};

/// Renders base units as a decimal token amount, trimming trailing zeros.
pub fn format_amount(amount: u128) -> String {
    let scale = 10u128.pow(DECIMALS);
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = DECIMALS as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Parses a decimal token amount ("1.5") into base units.
pub fn parse_amount(s: &str) -> Result<u128> {
    let invalid = || Error::InvalidAmount(s.to_string());
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if frac.len() > DECIMALS as usize {
        return Err(invalid());
    }
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let frac_units: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = DECIMALS as usize);
        padded.parse().map_err(|_| invalid())?
    };
    whole
        .checked_mul(10u128.pow(DECIMALS))
        .and_then(|units| units.checked_add(frac_units))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_formatting() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(1_500_000_000_000_000_000), "1.5");
        assert_eq!(format_amount(10_000_000_000_000_000_000), "10");
        assert_eq!(format_amount(1), "0.000000000000000001");
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_amount("1.5").unwrap(), 1_500_000_000_000_000_000);
        assert_eq!(parse_amount("0.5").unwrap(), 500_000_000_000_000_000);
        assert_eq!(parse_amount("10").unwrap(), 10_000_000_000_000_000_000);
        assert!(parse_amount("").is_err());
        assert!(parse_amount("1.0000000000000000001").is_err());
        assert!(parse_amount("abc").is_err());
    }
}
