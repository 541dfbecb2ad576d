use crate::error::{Result, SchedulerError};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Parses a decimal amount stored as a string on an entity.
///
/// An empty string reads as zero, matching records that were created before
/// the field was populated.
pub fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(trimmed).map_err(|_| SchedulerError::DecimalError {
        field,
        value: value.to_string(),
    })
}

/// Quantity moved by a settlement transaction. Zero and negative
/// quantities never reach the transaction store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amount(Decimal);

impl Amount {
    pub fn positive(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(SchedulerError::ValidationError(format!(
                "non-positive transfer amount {value}"
            )));
        }
        Ok(Self(value.normalize()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
