//! Exact decimal number handling.
//!
//! Numbers are stored as text and manipulated as [`BigDecimal`] so that
//! arithmetic and comparison are exact; floating point is never involved.
//! The value model caps numbers at [`MAX_SIGNIFICANT_DIGITS`] significant
//! digits with a decimal exponent in [[`MIN_EXPONENT`], [`MAX_EXPONENT`]].

use bigdecimal::{BigDecimal, Zero};

use crate::error::ValidationError;

/// Maximum number of significant digits a number value may carry.
pub const MAX_SIGNIFICANT_DIGITS: u64 = 38;

/// Largest permitted decimal exponent (magnitude below 1E+126).
pub const MAX_EXPONENT: i64 = 125;

/// Smallest permitted decimal exponent (magnitude at least 1E-130).
pub const MIN_EXPONENT: i64 = -130;

/// Parse the textual form of a number value, enforcing the model's
/// precision and magnitude limits.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidNumber`] for text that is not a decimal
/// number, and [`ValidationError::NumberOverflow`] for numbers outside the
/// permitted range.
pub fn parse_number(text: &str) -> Result<BigDecimal, ValidationError> {
    let parsed: BigDecimal =
        text.trim()
            .parse()
            .map_err(|_| ValidationError::InvalidNumber {
                message: format!("'{text}' is not a valid decimal"),
            })?;
    check_range(&parsed)?;
    Ok(parsed)
}

/// Check that a decimal fits the model's digit and exponent limits.
///
/// # Errors
///
/// Returns [`ValidationError::NumberOverflow`] when the limits are exceeded.
pub fn check_range(value: &BigDecimal) -> Result<(), ValidationError> {
    if value.is_zero() {
        return Ok(());
    }
    let normalized = value.normalized();
    let digits = normalized.digits();
    if digits > MAX_SIGNIFICANT_DIGITS {
        return Err(ValidationError::NumberOverflow {
            message: format!(
                "{digits} significant digits exceeds the {MAX_SIGNIFICANT_DIGITS}-digit limit"
            ),
        });
    }
    let (_, scale) = normalized.as_bigint_and_exponent();
    // Exponent of the most significant digit. `digits` is at most 38 here,
    // so the cast cannot truncate.
    #[allow(clippy::cast_possible_wrap)]
    let adjusted = digits as i64 - 1 - scale;
    if adjusted > MAX_EXPONENT {
        return Err(ValidationError::NumberOverflow {
            message: format!("magnitude exceeds 1E+{}", MAX_EXPONENT + 1),
        });
    }
    if adjusted < MIN_EXPONENT {
        return Err(ValidationError::NumberOverflow {
            message: format!("magnitude is below 1E{MIN_EXPONENT}"),
        });
    }
    Ok(())
}

/// Render a decimal back to the canonical textual form stored in a number
/// value: plain notation, no trailing fractional zeros.
#[must_use]
pub fn format_number(value: &BigDecimal) -> String {
    if value.is_zero() {
        return "0".to_owned();
    }
    value.normalized().to_string()
}
