use rust_decimal::Decimal;
use thiserror::Error;

use crate::form::FormState;
use crate::party::PartyType;

/// Problems found while computing or validating a split.
///
/// None of these are fatal: they are ordinary states while a form is being
/// edited and are handed back to the caller as values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error(
        "party percentages total {total}%, expected 100% (±{tolerance}); adjust the shares or force save"
    )]
    PercentageMismatch { total: Decimal, tolerance: Decimal },

    #[error(
        "party amounts total {parties_total}, payment is {payment_total} (±{tolerance}); adjust the amounts or force save"
    )]
    AmountMismatch {
        payment_total: Decimal,
        parties_total: Decimal,
        tolerance: Decimal,
    },

    #[error("enter a payment amount greater than zero")]
    InvalidTotal,

    #[error("party {index}: select a {party_type} or change the party type to other")]
    MissingPartyReference { index: usize, party_type: PartyType },

    #[error("party {index}: percentage {percentage} must be between 0 and 100")]
    PercentageOutOfRange { index: usize, percentage: Decimal },

    #[error("party {index}: amount {amount} cannot be negative")]
    NegativeAmount { index: usize, amount: Decimal },

    #[error("no party at row {index}")]
    PartyIndexOutOfRange { index: usize },

    #[error("cannot move split form from {from:?} to {to:?}")]
    InvalidTransition { from: FormState, to: FormState },
}

impl SplitError {
    /// Mismatches may be accepted with an explicit override; everything else blocks.
    pub fn is_overridable(&self) -> bool {
        matches!(
            self,
            SplitError::PercentageMismatch { .. } | SplitError::AmountMismatch { .. }
        )
    }
}
