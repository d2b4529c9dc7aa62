//! Percentage split of a payment across parties.
//!
//! All money math runs on integer minor units. Percentages stay exact
//! `Decimal`s until the final floor, so no float error can accumulate
//! however many parties share a payment.

use std::collections::BTreeMap;

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::currency::{round_amount, MinorUnits};
use crate::error::SplitError;
use crate::party::PartyShare;

/// Default allowed deviation for percentage and amount totals (0.01).
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Hundredths of a percent in a whole (100.00%).
const WHOLE_HUNDREDTHS: i64 = 10_000;

/// Tunables for split validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Allowed deviation for both percentage and amount totals.
    pub tolerance: Decimal,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Computed amounts keyed by party row index.
pub type ComputedAmounts = BTreeMap<usize, Decimal>;

/// Outcome of a total check that did not block submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TotalCheck {
    /// No party carries the relevant field.
    Skipped,
    WithinTolerance,
    /// Mismatch accepted because the caller forced it.
    Overridden(SplitError),
}

impl TotalCheck {
    pub fn warning(&self) -> Option<&SplitError> {
        match self {
            TotalCheck::Overridden(err) => Some(err),
            _ => None,
        }
    }
}

struct RawShare {
    index: usize,
    floor: i64,
    fraction: Decimal,
}

/// Largest-remainder apportionment of `total` minor units by percentage.
///
/// `shares` are `(row index, percentage)` pairs in input order. Leftover
/// units go one at a time to the largest fractional remainders, ties to the
/// earlier row, cycling if there are more leftovers than rows. A negative
/// leftover (percentages above 100) distributes nothing.
pub fn apportion(total: MinorUnits, shares: &[(usize, Decimal)]) -> BTreeMap<usize, MinorUnits> {
    let total_units = Decimal::from(total.0);
    let mut raws: Vec<RawShare> = shares
        .iter()
        .filter_map(|&(index, percentage)| {
            let raw = percentage
                .checked_mul(total_units)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED));
            let Some(raw) = raw else {
                tracing::warn!(index, %percentage, "share overflows decimal range, skipping");
                return None;
            };
            let floor = raw.floor();
            let Some(floor_units) = floor.to_i64() else {
                tracing::warn!(index, %percentage, "share exceeds minor unit range, skipping");
                return None;
            };
            Some(RawShare {
                index,
                floor: floor_units,
                fraction: raw - floor,
            })
        })
        .collect();

    let mut assigned: BTreeMap<usize, MinorUnits> = raws
        .iter()
        .map(|r| (r.index, MinorUnits(r.floor)))
        .collect();
    if raws.is_empty() {
        return assigned;
    }

    let sum_floor: i64 = raws.iter().map(|r| r.floor).sum();
    let remainder = total.0 - sum_floor;

    // stable: equal fractions keep input order
    raws.sort_by(|a, b| b.fraction.cmp(&a.fraction));
    let rows = raws.len() as i64;
    let remainder = remainder.max(0);
    let (rounds, extra) = (remainder / rows, remainder % rows);
    for (rank, raw) in raws.iter().enumerate() {
        let bonus = rounds + i64::from((rank as i64) < extra);
        if let Some(units) = assigned.get_mut(&raw.index) {
            units.0 += bonus;
        }
    }
    assigned
}

/// Penny-accurate amounts for every party that declares a percentage.
///
/// Empty when `total` is zero, negative, or rounds to no minor units; that is
/// a normal mid-edit state, not an error.
pub fn compute_amounts_from_percentages(total: Decimal, parties: &[PartyShare]) -> ComputedAmounts {
    let Some(total_units) = MinorUnits::from_major(total).filter(|t| t.is_positive()) else {
        return ComputedAmounts::new();
    };
    let shares: Vec<(usize, Decimal)> = parties
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.percentage.map(|pct| (i, pct)))
        .collect();
    if shares.is_empty() {
        return ComputedAmounts::new();
    }
    apportion(total_units, &shares)
        .into_iter()
        .map(|(i, units)| (i, units.to_major()))
        .collect()
}

/// Divide 100% evenly across `party_count` parties at 0.01% granularity.
///
/// Leftover hundredths go one each to the first parties, so the shares
/// always add up to exactly 100.00.
pub fn split_equally(party_count: usize) -> Vec<Decimal> {
    if party_count == 0 {
        return Vec::new();
    }
    let n = party_count as i64;
    let base = WHOLE_HUNDREDTHS / n;
    let leftover = WHOLE_HUNDREDTHS - base * n;
    (0..n)
        .map(|i| {
            let hundredths = if i < leftover { base + 1 } else { base };
            Decimal::new(hundredths, 2)
        })
        .collect()
}

/// Sum of the declared percentages, `None` when no party declares one.
pub fn percentage_total(parties: &[PartyShare]) -> Option<Decimal> {
    let mut declared = parties.iter().filter_map(|p| p.percentage).peekable();
    declared.peek()?;
    Some(declared.sum())
}

/// Sum of the declared amounts, `None` when no party declares one.
pub fn amount_total(parties: &[PartyShare]) -> Option<Decimal> {
    let mut declared = parties.iter().filter_map(|p| p.amount).peekable();
    declared.peek()?;
    Some(round_amount(declared.sum()))
}

/// Percentages must add up to 100 within `tolerance`.
///
/// Skipped when no party declares a percentage. With `force`, a mismatch is
/// returned as a warning instead of an error.
pub fn validate_percentage_total(
    parties: &[PartyShare],
    tolerance: Decimal,
    force: bool,
) -> Result<TotalCheck, SplitError> {
    let Some(total) = percentage_total(parties) else {
        return Ok(TotalCheck::Skipped);
    };
    if (total - Decimal::ONE_HUNDRED).abs() <= tolerance {
        return Ok(TotalCheck::WithinTolerance);
    }
    let mismatch = SplitError::PercentageMismatch { total, tolerance };
    if force {
        tracing::warn!(%total, "percentage mismatch accepted by override");
        Ok(TotalCheck::Overridden(mismatch))
    } else {
        Err(mismatch)
    }
}

/// Amounts (manual or computed) must add up to the payment total within `tolerance`.
///
/// Skipped when no party declares an amount. With `force`, a mismatch is
/// returned as a warning instead of an error.
pub fn validate_amount_total(
    parties: &[PartyShare],
    total: Decimal,
    tolerance: Decimal,
    force: bool,
) -> Result<TotalCheck, SplitError> {
    let Some(parties_total) = amount_total(parties) else {
        return Ok(TotalCheck::Skipped);
    };
    if (parties_total - total).abs() <= tolerance {
        return Ok(TotalCheck::WithinTolerance);
    }
    let mismatch = SplitError::AmountMismatch {
        payment_total: total,
        parties_total,
        tolerance,
    };
    if force {
        tracing::warn!(%total, %parties_total, "amount mismatch accepted by override");
        Ok(TotalCheck::Overridden(mismatch))
    } else {
        Err(mismatch)
    }
}
