use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SplitError;

/// Role a party plays in a payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyType {
    #[default]
    Owner,
    Investor,
    Buyer,
    /// Unlisted third party, identified only by `party_name`.
    Other,
}

impl fmt::Display for PartyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartyType::Owner => write!(f, "owner"),
            PartyType::Investor => write!(f, "investor"),
            PartyType::Buyer => write!(f, "buyer"),
            PartyType::Other => write!(f, "other"),
        }
    }
}

/// Backend record id of an owner, investor or buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(pub u64);

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One row of a payment split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartyShare {
    pub party_type: PartyType,
    #[serde(default)]
    pub party_id: Option<PartyId>,
    /// Free-text label for `other` parties, display fallback for the rest.
    #[serde(default)]
    pub party_name: String,
    /// Share of the payment in percent, 0 to 100.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub percentage: Option<Decimal>,
    /// Amount in major units. Computed unless `manual_amount` is set.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub manual_amount: bool,
}

impl PartyShare {
    /// A blank row of the given type.
    pub fn new(party_type: PartyType) -> Self {
        Self {
            party_type,
            ..Self::default()
        }
    }

    /// A row for a listed owner, investor or buyer.
    pub fn listed(party_type: PartyType, id: PartyId, name: impl Into<String>) -> Self {
        Self {
            party_type,
            party_id: Some(id),
            party_name: name.into(),
            ..Self::default()
        }
    }

    /// A row for an unlisted third party.
    pub fn other(name: impl Into<String>) -> Self {
        Self {
            party_type: PartyType::Other,
            party_name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_percentage(mut self, percentage: Decimal) -> Self {
        self.percentage = Some(percentage);
        self
    }

    /// Set a user-authored amount.
    pub fn with_manual_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self.manual_amount = true;
        self
    }

    /// Listed parties must point at a backend record.
    pub fn requires_reference(&self) -> bool {
        self.party_type != PartyType::Other
    }

    pub fn display_name(&self) -> String {
        match (self.party_name.trim(), self.party_id) {
            ("", Some(id)) => format!("{} {id}", self.party_type),
            ("", None) => format!("unnamed {}", self.party_type),
            (name, _) => name.to_string(),
        }
    }

    /// Field-level checks that no override can bypass.
    pub fn check(&self, index: usize) -> Result<(), SplitError> {
        if self.requires_reference() && self.party_id.is_none() {
            return Err(SplitError::MissingPartyReference {
                index,
                party_type: self.party_type,
            });
        }
        if let Some(percentage) = self.percentage {
            if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
                return Err(SplitError::PercentageOutOfRange { index, percentage });
            }
        }
        if let Some(amount) = self.amount {
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(SplitError::NegativeAmount { index, amount });
            }
        }
        Ok(())
    }
}

/// A person attached to a deal, as offered in the party picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub party_type: PartyType,
    pub id: PartyId,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterOwner {
    pub id: PartyId,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterInvestor {
    pub id: PartyId,
    #[serde(default)]
    pub investor_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterBuyer {
    pub id: PartyId,
    #[serde(default)]
    pub name: Option<String>,
}

/// The owners, investors and buyers of a deal (subset of the deal detail body).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealParticipants {
    #[serde(default)]
    pub owners: Vec<RosterOwner>,
    #[serde(default)]
    pub investors: Vec<RosterInvestor>,
    #[serde(default)]
    pub buyers: Vec<RosterBuyer>,
}

impl DealParticipants {
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty() && self.investors.is_empty() && self.buyers.is_empty()
    }

    /// Flatten the roster: owners, then investors, then buyers.
    pub fn participants(&self) -> Vec<Participant> {
        let owners = self.owners.iter().map(|o| Participant {
            party_type: PartyType::Owner,
            id: o.id,
            name: o.name.clone().unwrap_or_default(),
            role: "owner".to_string(),
        });
        let investors = self.investors.iter().map(|i| Participant {
            party_type: PartyType::Investor,
            id: i.id,
            name: i.investor_name.clone().unwrap_or_default(),
            role: "investor".to_string(),
        });
        let buyers = self.buyers.iter().map(|b| Participant {
            party_type: PartyType::Buyer,
            id: b.id,
            name: b.name.clone().unwrap_or_default(),
            role: "buyer".to_string(),
        });
        owners.chain(investors).chain(buyers).collect()
    }

    /// One blank split row per participant.
    pub fn party_rows(&self) -> Vec<PartyShare> {
        self.participants()
            .into_iter()
            .map(|p| PartyShare::listed(p.party_type, p.id, p.name))
            .collect()
    }
}
