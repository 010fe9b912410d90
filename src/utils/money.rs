//! Dollar amounts at the HTTP boundary, integer cents everywhere else.
//!
//! Summing cents is exact, so balances never drift no matter how many small
//! payments a registration accumulates.

use crate::error::{AppError, AppResult};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

const DECIMAL_PLACES: u32 = 2;

/// Largest single amount accepted ($10,000,000.00)
const MAX_AMOUNT_CENTS: i64 = 1_000_000_000;

/// Convert a decimal dollar amount to cents, rejecting sub-cent precision.
pub fn to_cents(amount: Decimal) -> AppResult<i64> {
    let normalized = amount.normalize();
    if normalized.scale() > DECIMAL_PLACES {
        return Err(AppError::InvalidAmount(
            "Amount cannot have more than two decimal places".to_string(),
        ));
    }
    let cents = (normalized * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| AppError::InvalidAmount("Amount is out of range".to_string()))?;
    if cents.abs() > MAX_AMOUNT_CENTS {
        return Err(AppError::InvalidAmount("Amount is out of range".to_string()));
    }
    Ok(cents)
}

/// Convert a payment amount to cents; must be strictly positive.
pub fn payment_cents(amount: Decimal) -> AppResult<i64> {
    let cents = to_cents(amount)?;
    if cents <= 0 {
        return Err(AppError::InvalidAmount(
            "Payment amount must be greater than 0".to_string(),
        ));
    }
    Ok(cents)
}

pub fn to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}
