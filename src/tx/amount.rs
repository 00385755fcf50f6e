//! Decimal amounts and their stroop representation.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::domain::ValidationError;

/// Smallest unit: one stroop is 1e-7 of an asset unit
pub const STROOP_DECIMALS: u32 = 7;
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

pub fn parse_amount(amount: &str) -> Result<Decimal, ValidationError> {
    Decimal::from_str(amount.trim())
        .map_err(|e| ValidationError::InvalidAmount(format!("{}: {}", amount, e)))
}

/// Convert a decimal string such as `"12.5"` into stroops
pub fn to_stroops(amount: &str) -> Result<i64, ValidationError> {
    decimal_to_stroops(parse_amount(amount)?)
}

pub fn decimal_to_stroops(value: Decimal) -> Result<i64, ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::InvalidAmount(format!(
            "{} is negative",
            value
        )));
    }
    if value.normalize().scale() > STROOP_DECIMALS {
        return Err(ValidationError::InvalidAmount(format!(
            "{} has more than {} decimal places",
            value, STROOP_DECIMALS
        )));
    }
    value
        .checked_mul(Decimal::from(STROOPS_PER_UNIT))
        .and_then(|scaled| scaled.to_i64())
        .ok_or_else(|| ValidationError::InvalidAmount(format!("{} is out of range", value)))
}

/// Same as [`to_stroops`] but zero is rejected
pub fn to_positive_stroops(amount: &str) -> Result<i64, ValidationError> {
    let stroops = to_stroops(amount)?;
    if stroops == 0 {
        return Err(ValidationError::InvalidAmount(format!(
            "{} must be greater than 0",
            amount
        )));
    }
    Ok(stroops)
}

/// Render stroops with the ledger's fixed 7 decimal places
pub fn stroops_to_string(stroops: i64) -> String {
    Decimal::new(stroops, STROOP_DECIMALS).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_stroops() {
        assert_eq!(to_stroops("1").unwrap(), 10_000_000);
        assert_eq!(to_stroops("12.5").unwrap(), 125_000_000);
        assert_eq!(to_stroops("0.0000001").unwrap(), 1);
        assert_eq!(to_stroops(" 100 ").unwrap(), 1_000_000_000);
        assert_eq!(to_stroops("0").unwrap(), 0);
        assert_eq!(to_stroops("1.50000000").unwrap(), 15_000_000);
    }

    #[test]
    fn test_to_stroops_rejects_bad_input() {
        assert!(to_stroops("0.00000001").is_err());
        assert!(to_stroops("-1").is_err());
        assert!(to_stroops("abc").is_err());
        assert!(to_stroops("").is_err());
        // i64::MAX stroops is ~922337203685.4775807 units
        assert!(to_stroops("922337203686").is_err());
        assert_eq!(to_stroops("922337203685.4775807").unwrap(), i64::MAX);
    }

    #[test]
    fn test_to_positive_stroops() {
        assert!(to_positive_stroops("0").is_err());
        assert!(to_positive_stroops("0.0").is_err());
        assert_eq!(to_positive_stroops("2").unwrap(), 20_000_000);
    }

    #[test]
    fn test_stroops_to_string() {
        assert_eq!(stroops_to_string(10_000_000), "1.0000000");
        assert_eq!(stroops_to_string(1), "0.0000001");
        assert_eq!(stroops_to_string(0), "0.0000000");
    }
}
