//! Conversion between wire amounts and display amounts.
//!
//! The native currency is carried on the wire as an integer count of
//! 10^-6 units. Every other token is already decimal and passes through.
//! Divisibility is decided by token identity, never by the size of the number.

use crate::error::{DexError, Result};
use crate::models::{is_native_ticker, Token};

/// Wire units per display unit for divisible tokens.
pub const DIVISIBILITY_FACTOR: f64 = 1_000_000.0;

/// Anything that knows whether its amounts travel in divisible units.
pub trait Denomination {
    fn uses_divisible_units(&self) -> bool;
}

impl Denomination for Token {
    fn uses_divisible_units(&self) -> bool {
        self.uses_divisible_units
    }
}

impl Denomination for str {
    fn uses_divisible_units(&self) -> bool {
        is_native_ticker(self)
    }
}

impl Denomination for String {
    fn uses_divisible_units(&self) -> bool {
        is_native_ticker(self)
    }
}

fn check_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() {
        return Err(DexError::validation(format!("amount {} is not a number", amount)));
    }
    if amount < 0.0 {
        return Err(DexError::validation(format!("amount {} is negative", amount)));
    }
    Ok(())
}

pub fn to_display<D: Denomination + ?Sized>(raw: f64, token: &D) -> Result<f64> {
    check_amount(raw)?;
    if token.uses_divisible_units() {
        Ok(raw / DIVISIBILITY_FACTOR)
    } else {
        Ok(raw)
    }
}

pub fn to_wire<D: Denomination + ?Sized>(display: f64, token: &D) -> Result<f64> {
    check_amount(display)?;
    if token.uses_divisible_units() {
        Ok((display * DIVISIBILITY_FACTOR).round())
    } else {
        Ok(display)
    }
}

/// Parse user-entered amount and price into positive decimals.
pub fn parse_order_input(amount: &str, price: &str) -> Result<(f64, f64)> {
    let amount = parse_positive("amount", amount)?;
    let price = parse_positive("price", price)?;
    Ok((amount, price))
}

fn parse_positive(field: &str, input: &str) -> Result<f64> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DexError::validation(format!("{} is required", field)));
    }
    let value: f64 = input
        .parse()
        .map_err(|_| DexError::validation(format!("{} must be a number, got {:?}", field, input)))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(DexError::validation(format!(
            "{} must be greater than zero, got {}",
            field, input
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_divides_by_factor() {
        assert_eq!(to_display(2_500_000.0, "NXS").unwrap(), 2.5);
        assert_eq!(to_wire(2.5, "NXS").unwrap(), 2_500_000.0);
        assert_eq!(to_display(2_500_000.0, &Token::native()).unwrap(), 2.5);
    }

    #[test]
    fn test_other_tokens_pass_through() {
        let gold = Token::new("GOLD", "8Ab", 1000.0, 1000.0, 2);
        assert_eq!(to_display(2_500_000.0, &gold).unwrap(), 2_500_000.0);
        assert_eq!(to_wire(10.0, "GOLD").unwrap(), 10.0);
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let gold = Token::new("GOLD", "8Ab", 1000.0, 1000.0, 2);
        for x in [0.0, 0.000001, 1.0, 2.5, 123.456789, 98765.4321] {
            let nxs = to_display(to_wire(x, &Token::native()).unwrap(), &Token::native()).unwrap();
            assert!((nxs - x).abs() < 1e-6, "NXS round trip of {} gave {}", x, nxs);
            let g = to_display(to_wire(x, &gold).unwrap(), &gold).unwrap();
            assert!((g - x).abs() < 1e-6, "GOLD round trip of {} gave {}", x, g);
        }
    }

    #[test]
    fn test_malformed_amounts_fail_fast() {
        assert!(matches!(to_display(f64::NAN, "NXS"), Err(DexError::Validation(_))));
        assert!(to_display(-1.0, "GOLD").is_err());
        assert!(to_wire(f64::INFINITY, "NXS").is_err());
    }

    #[test]
    fn test_parse_order_input() {
        assert_eq!(parse_order_input(" 10 ", "0.25").unwrap(), (10.0, 0.25));
        assert!(parse_order_input("", "1").is_err());
        assert!(parse_order_input("ten", "1").is_err());
        assert!(parse_order_input("1", "0").is_err());
        assert!(parse_order_input("1", "NaN").is_err());
    }
}
