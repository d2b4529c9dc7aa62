use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Decimal places carried by every amount that crosses the API boundary.
pub const AMOUNT_DP: u32 = 2;

/// Supported display currencies. Arithmetic never depends on the currency;
/// both carry two minor digits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Inr => write!(f, "INR"),
            Currency::Usd => write!(f, "USD"),
        }
    }
}

impl Currency {
    pub fn all() -> &'static [Currency] {
        &[Currency::Inr, Currency::Usd]
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Inr => "₹",
            Currency::Usd => "$",
        }
    }

    pub fn minor_unit_name(&self) -> &'static str {
        match self {
            Currency::Inr => "paise",
            Currency::Usd => "cents",
        }
    }
}

/// A whole number of minor currency units (paise).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MinorUnits(pub i64);

impl MinorUnits {
    pub const ZERO: MinorUnits = MinorUnits(0);

    /// Round a major-unit amount to the nearest minor unit, halves away from zero.
    /// `None` when the amount does not fit in `i64` minor units.
    pub fn from_major(amount: Decimal) -> Option<Self> {
        amount
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(MinorUnits)
    }

    /// The amount in major units, always at two decimal places.
    pub fn to_major(self) -> Decimal {
        Decimal::new(self.0, AMOUNT_DP)
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Add for MinorUnits {
    type Output = MinorUnits;

    fn add(self, rhs: MinorUnits) -> MinorUnits {
        MinorUnits(self.0 + rhs.0)
    }
}

impl Sub for MinorUnits {
    type Output = MinorUnits;

    fn sub(self, rhs: MinorUnits) -> MinorUnits {
        MinorUnits(self.0 - rhs.0)
    }
}

impl Sum for MinorUnits {
    fn sum<I: Iterator<Item = MinorUnits>>(iter: I) -> MinorUnits {
        iter.fold(MinorUnits::ZERO, Add::add)
    }
}

/// Round a major-unit amount to two decimal places, halves away from zero.
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Format a major-unit amount for display, e.g. `₹12,34,567.50` or `$1,234,567.50`.
///
/// Rupees use Indian grouping (last three digits, then pairs).
pub fn format_amount(amount: Decimal, currency: &Currency) -> String {
    let rounded = round_amount(amount);
    let digits = format!("{:.2}", rounded.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!(
        "{sign}{}{}.{fraction}",
        currency.symbol(),
        group_digits(whole, currency)
    )
}

fn group_digits(whole: &str, currency: &Currency) -> String {
    if whole.len() <= 3 {
        return whole.to_string();
    }
    let (head, tail) = whole.split_at(whole.len() - 3);
    let group = match currency {
        Currency::Inr => 2,
        Currency::Usd => 3,
    };
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(group);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_major_rounds_half_away_from_zero() {
        assert_eq!(MinorUnits::from_major(dec!(10.00)), Some(MinorUnits(1000)));
        assert_eq!(MinorUnits::from_major(dec!(0.005)), Some(MinorUnits(1)));
        assert_eq!(MinorUnits::from_major(dec!(0.004)), Some(MinorUnits(0)));
        assert_eq!(MinorUnits::from_major(dec!(-0.005)), Some(MinorUnits(-1)));
        assert_eq!(MinorUnits::from_major(dec!(1234.567)), Some(MinorUnits(123457)));
    }

    #[test]
    fn test_to_major_keeps_two_places() {
        assert_eq!(MinorUnits(3334).to_major().to_string(), "33.34");
        assert_eq!(MinorUnits(5).to_major().to_string(), "0.05");
        assert_eq!(MinorUnits(-150).to_major(), dec!(-1.50));
    }

    #[test]
    fn test_minor_units_sum() {
        let total: MinorUnits = [MinorUnits(333), MinorUnits(333), MinorUnits(334)]
            .into_iter()
            .sum();
        assert_eq!(total, MinorUnits(1000));
    }

    #[test]
    fn test_format_amount_inr_grouping() {
        assert_eq!(format_amount(dec!(1234567.5), &Currency::Inr), "₹12,34,567.50");
        assert_eq!(format_amount(dec!(999), &Currency::Inr), "₹999.00");
        assert_eq!(format_amount(dec!(100000), &Currency::Inr), "₹1,00,000.00");
    }

    #[test]
    fn test_format_amount_usd_grouping() {
        assert_eq!(format_amount(dec!(1234567.5), &Currency::Usd), "$1,234,567.50");
        assert_eq!(format_amount(dec!(-12.345), &Currency::Usd), "-$12.35");
    }
}
