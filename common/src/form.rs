//! Payment split form session.
//!
//! Owns the party rows being edited and drives the calculator: every edit
//! recomputes the preview, refreshes non-manual amounts, and moves the form
//! through [`FormState`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::round_amount;
use crate::error::SplitError;
use crate::party::{DealParticipants, PartyId, PartyShare, PartyType};
use crate::payment::PartyPayload;
use crate::split::{self, ComputedAmounts, SplitConfig, TotalCheck};

/// Where the split form is in its edit/submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormState {
    Editing,
    /// Computed amounts are shown but not applied.
    Previewing,
    /// Computed amounts are being copied into the amount fields.
    Applying,
    Validating,
    Valid,
    Invalid,
    /// Handed to the payment API. Only `reset` leaves this state.
    Submitted,
}

impl FormState {
    /// Returns true if moving from self to `next` is allowed.
    pub fn can_transition_to(&self, next: &FormState) -> bool {
        matches!(
            (self, next),
            (FormState::Editing, FormState::Previewing)
                | (FormState::Editing, FormState::Validating)
                | (FormState::Previewing, FormState::Editing)
                | (FormState::Previewing, FormState::Applying)
                | (FormState::Previewing, FormState::Validating)
                | (FormState::Applying, FormState::Editing)
                | (FormState::Validating, FormState::Valid)
                | (FormState::Validating, FormState::Invalid)
                | (FormState::Invalid, FormState::Valid)
                | (FormState::Invalid, FormState::Editing)
                | (FormState::Valid, FormState::Submitted)
                | (FormState::Valid, FormState::Editing)
        )
    }
}

/// A validated split, ready for the payment-creation API.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedSplit {
    /// Payment total rounded to minor units.
    pub payment_total: Decimal,
    pub parties: Vec<PartyPayload>,
    /// Sent as `force=true` so the backend skips its own mismatch check.
    pub force: bool,
    /// Mismatches accepted by the override.
    pub warnings: Vec<SplitError>,
}

#[derive(Debug, Clone)]
pub struct SplitForm {
    config: SplitConfig,
    total: Option<Decimal>,
    parties: Vec<PartyShare>,
    force: bool,
    state: FormState,
    preview: ComputedAmounts,
    errors: Vec<SplitError>,
    warnings: Vec<SplitError>,
}

impl SplitForm {
    /// An empty form with a single blank owner row.
    pub fn new(config: SplitConfig) -> Self {
        Self {
            config,
            total: None,
            parties: vec![PartyShare::new(PartyType::Owner)],
            force: false,
            state: FormState::Editing,
            preview: ComputedAmounts::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// A form pre-filled with rows, e.g. loaded from a request file.
    ///
    /// Rows that carry an amount but no percentage are amount-driven and
    /// treated as manual so the calculator leaves them alone.
    pub fn with_parties(config: SplitConfig, total: Option<Decimal>, parties: Vec<PartyShare>) -> Self {
        let mut form = Self::new(config);
        form.total = total;
        form.parties = parties
            .into_iter()
            .map(|mut p| {
                if p.amount.is_some() && p.percentage.is_none() {
                    p.manual_amount = true;
                }
                p
            })
            .collect();
        form.recompute();
        form
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn total(&self) -> Option<Decimal> {
        self.total
    }

    pub fn parties(&self) -> &[PartyShare] {
        &self.parties
    }

    pub fn force(&self) -> bool {
        self.force
    }

    /// Amounts the calculator would assign, keyed by row.
    pub fn preview(&self) -> &ComputedAmounts {
        &self.preview
    }

    /// Blocking problems from the last validation.
    pub fn errors(&self) -> &[SplitError] {
        &self.errors
    }

    /// Mismatches accepted by the override in the last validation.
    pub fn warnings(&self) -> &[SplitError] {
        &self.warnings
    }

    /// Running percentage total for display.
    pub fn percentage_total(&self) -> Decimal {
        split::percentage_total(&self.parties).unwrap_or_default()
    }

    /// Running amount total for display.
    pub fn amount_total(&self) -> Decimal {
        split::amount_total(&self.parties).unwrap_or_default()
    }

    // ─── Edits ──────────────────────────────────────────────────────────────

    pub fn set_total(&mut self, total: Option<Decimal>) -> Result<(), SplitError> {
        self.edit(|form| {
            form.total = total;
            Ok(())
        })
    }

    pub fn add_party(&mut self, party_type: PartyType) -> Result<usize, SplitError> {
        self.edit(|form| {
            form.parties.push(PartyShare::new(party_type));
            Ok(form.parties.len() - 1)
        })
    }

    pub fn remove_party(&mut self, index: usize) -> Result<PartyShare, SplitError> {
        self.edit(|form| {
            form.row(index)?;
            Ok(form.parties.remove(index))
        })
    }

    /// Change a row's type; the previous selection no longer applies.
    pub fn set_party_type(&mut self, index: usize, party_type: PartyType) -> Result<(), SplitError> {
        self.edit(|form| {
            let row = form.row(index)?;
            row.party_type = party_type;
            row.party_id = None;
            row.party_name.clear();
            Ok(())
        })
    }

    pub fn set_party_ref(
        &mut self,
        index: usize,
        party_id: Option<PartyId>,
        party_name: impl Into<String>,
    ) -> Result<(), SplitError> {
        let party_name = party_name.into();
        self.edit(|form| {
            let row = form.row(index)?;
            row.party_id = party_id;
            row.party_name = party_name;
            Ok(())
        })
    }

    pub fn set_percentage(&mut self, index: usize, percentage: Option<Decimal>) -> Result<(), SplitError> {
        self.edit(|form| {
            form.row(index)?.percentage = percentage;
            Ok(())
        })
    }

    /// Type an amount by hand; the row becomes manual.
    pub fn set_amount(&mut self, index: usize, amount: Option<Decimal>) -> Result<(), SplitError> {
        self.edit(|form| {
            let row = form.row(index)?;
            row.amount = amount;
            row.manual_amount = true;
            Ok(())
        })
    }

    /// Turning manual off hands the amount back to the calculator.
    pub fn set_manual(&mut self, index: usize, manual: bool) -> Result<(), SplitError> {
        self.edit(|form| {
            form.row(index)?.manual_amount = manual;
            Ok(())
        })
    }

    pub fn set_force(&mut self, force: bool) -> Result<(), SplitError> {
        self.edit(|form| {
            form.force = force;
            Ok(())
        })
    }

    /// Give every row an equal percentage and let the calculator fill the amounts.
    pub fn split_equally(&mut self) -> Result<(), SplitError> {
        self.edit(|form| {
            let shares = split::split_equally(form.parties.len());
            for (row, share) in form.parties.iter_mut().zip(shares) {
                row.percentage = Some(share);
                row.amount = None;
                row.manual_amount = false;
            }
            Ok(())
        })
    }

    /// Replace the rows with one blank row per deal participant.
    ///
    /// An empty roster leaves the form untouched. Returns the number of rows imported.
    pub fn import_participants(&mut self, roster: &DealParticipants) -> Result<usize, SplitError> {
        if roster.is_empty() {
            tracing::debug!("no participants to import");
            return Ok(0);
        }
        self.edit(|form| {
            form.parties = roster.party_rows();
            Ok(form.parties.len())
        })
    }

    /// Copy the previewed amounts into the amount fields and freeze them as manual.
    ///
    /// Returns the number of rows updated.
    pub fn apply_computed(&mut self) -> Result<usize, SplitError> {
        self.transition(FormState::Applying)?;
        let preview = std::mem::take(&mut self.preview);
        for (&index, &amount) in &preview {
            if let Some(row) = self.parties.get_mut(index) {
                row.amount = Some(amount);
                row.manual_amount = true;
            }
        }
        self.transition(FormState::Editing)?;
        self.recompute();
        Ok(preview.len())
    }

    /// Start over with a fresh form. Allowed from any state.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    // ─── Validation ─────────────────────────────────────────────────────────

    /// Run every check. `Ok` means the form is `Valid` (possibly by override);
    /// `Err` carries the first blocking problem, all of them are in [`errors`](Self::errors).
    pub fn validate(&mut self) -> Result<(), SplitError> {
        if matches!(self.state, FormState::Valid | FormState::Invalid) {
            self.transition(FormState::Editing)?;
        }
        self.transition(FormState::Validating)?;
        self.errors.clear();
        self.warnings.clear();

        let total = self.total.filter(|t| round_amount(*t) > Decimal::ZERO);
        if total.is_none() {
            self.errors.push(SplitError::InvalidTotal);
        }
        for (index, row) in self.parties.iter().enumerate() {
            if let Err(err) = row.check(index) {
                self.errors.push(err);
            }
        }

        let tolerance = self.config.tolerance;
        let mut checks = vec![split::validate_percentage_total(&self.parties, tolerance, self.force)];
        if let Some(total) = total {
            checks.push(split::validate_amount_total(
                &self.parties,
                round_amount(total),
                tolerance,
                self.force,
            ));
        }
        for check in checks {
            match check {
                Ok(TotalCheck::Overridden(warning)) => self.warnings.push(warning),
                Ok(_) => {}
                Err(err) => self.errors.push(err),
            }
        }

        if let Some(first) = self.errors.first().cloned() {
            tracing::debug!(errors = self.errors.len(), "split form invalid");
            self.transition(FormState::Invalid)?;
            return Err(first);
        }
        if !self.warnings.is_empty() {
            self.transition(FormState::Invalid)?;
            tracing::info!(warnings = self.warnings.len(), "split mismatch overridden by force save");
        }
        self.transition(FormState::Valid)?;
        Ok(())
    }

    /// Validate and hand over the finalized party list.
    pub fn submit(&mut self) -> Result<FinalizedSplit, SplitError> {
        self.validate()?;
        let payment_total = self
            .total
            .map(round_amount)
            .ok_or(SplitError::InvalidTotal)?;
        let finalized = FinalizedSplit {
            payment_total,
            parties: self.parties.iter().map(PartyPayload::from).collect(),
            force: self.force,
            warnings: self.warnings.clone(),
        };
        self.transition(FormState::Submitted)?;
        Ok(finalized)
    }

    // ─── Internals ──────────────────────────────────────────────────────────

    fn row(&mut self, index: usize) -> Result<&mut PartyShare, SplitError> {
        self.parties
            .get_mut(index)
            .ok_or(SplitError::PartyIndexOutOfRange { index })
    }

    fn transition(&mut self, next: FormState) -> Result<(), SplitError> {
        if !self.state.can_transition_to(&next) {
            return Err(SplitError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!(from = ?self.state, to = ?next, "split form transition");
        self.state = next;
        Ok(())
    }

    /// Leave preview/validation results behind before a field changes.
    fn begin_edit(&mut self) -> Result<(), SplitError> {
        match self.state {
            FormState::Editing => Ok(()),
            _ => self.transition(FormState::Editing),
        }
    }

    fn edit<T>(&mut self, apply: impl FnOnce(&mut Self) -> Result<T, SplitError>) -> Result<T, SplitError> {
        self.begin_edit()?;
        let out = apply(self);
        self.recompute();
        out
    }

    /// Refresh the preview and every non-manual amount. Must be called in `Editing`.
    fn recompute(&mut self) {
        self.errors.clear();
        self.warnings.clear();
        self.preview = split::compute_amounts_from_percentages(
            self.total.unwrap_or_default(),
            &self.parties,
        );
        for (index, row) in self.parties.iter_mut().enumerate() {
            if !row.manual_amount {
                row.amount = self.preview.get(&index).copied();
            }
        }
        if !self.preview.is_empty() {
            self.state = FormState::Previewing;
        }
    }
}
