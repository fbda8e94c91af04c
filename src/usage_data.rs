use crate::error::ValidationError;
use bigdecimal::BigDecimal;
use jiff::civil::{Date, DateTime, Time};
use std::str::FromStr;

/// One calculation request: two meter readings, when they were taken, and the unit rate.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterInput {
    pub previous_reading: BigDecimal,
    pub current_reading: BigDecimal,
    pub previous_date: DateTime,
    pub current_date: DateTime,
    pub rate_per_unit: BigDecimal,
}

impl MeterInput {
    /// Units consumed between the two readings, unrounded.
    pub fn total_units(&self) -> BigDecimal {
        &self.current_reading - &self.previous_reading
    }
}

/// Form values exactly as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMeterInput {
    pub previous_reading: String,
    pub current_reading: String,
    pub previous_date: String,
    pub current_date: String,
    pub rate_per_unit: String,
}

impl RawMeterInput {
    /// Parses every field, failing on the first one that is not a number or a date.
    pub fn parse(&self) -> Result<MeterInput, ValidationError> {
        Ok(MeterInput {
            previous_reading: parse_number("previous reading", &self.previous_reading)?,
            current_reading: parse_number("current reading", &self.current_reading)?,
            previous_date: parse_date("previous date", &self.previous_date)?,
            current_date: parse_date("current date", &self.current_date)?,
            rate_per_unit: parse_number("rate per unit", &self.rate_per_unit)?,
        })
    }
}

fn invalid(field: &'static str, value: &str) -> ValidationError {
    ValidationError::InvalidInput {
        field,
        value: value.to_owned(),
    }
}

/// Largest number of significant digits accepted in a form value.
const MAX_DIGITS: u64 = 64;
/// Largest decimal exponent, either way, accepted in a form value.
const MAX_SCALE: u64 = 64;

/// Parses a decimal number, rejecting values whose digits or exponent are too large to do
/// arithmetic on in bounded time (`1e-2000000000`).
pub fn parse_number(field: &'static str, value: &str) -> Result<BigDecimal, ValidationError> {
    let number = BigDecimal::from_str(value.trim()).map_err(|_| invalid(field, value))?;
    if number.digits() > MAX_DIGITS {
        return Err(invalid(field, value));
    }
    let (_, scale) = number.as_bigint_and_exponent();
    if scale.unsigned_abs() > MAX_SCALE {
        return Err(invalid(field, value));
    }
    Ok(number)
}

/// Accepts either a full civil date-time (`2024-01-01T23:59`) or a bare date, which means midnight.
pub fn parse_date(field: &'static str, value: &str) -> Result<DateTime, ValidationError> {
    let value_trimmed = value.trim();
    DateTime::from_str(value_trimmed)
        .or_else(|_| Date::from_str(value_trimmed).map(|date| date.to_datetime(Time::midnight())))
        .map_err(|_| invalid(field, value))
}
