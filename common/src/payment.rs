use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::form::FinalizedSplit;
use crate::party::{PartyId, PartyShare, PartyType};

/// Backend id of a land deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealId(pub u64);

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payment status as chosen on the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    /// Form-only alias, stored by the backend as `completed`.
    Paid,
    Completed,
    Overdue,
    Cancelled,
    Failed,
}

impl PaymentStatus {
    /// The status the backend stores.
    pub fn for_backend(self) -> PaymentStatus {
        match self {
            PaymentStatus::Paid => PaymentStatus::Completed,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    LandPurchase,
    InvestmentSale,
    DocumentationLegal,
    MaintenanceTaxes,
    Advance,
    Partial,
    Final,
    Registration,
    #[default]
    Other,
}

/// Payment details entered alongside the split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDraft {
    /// Payment total in major units.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    /// One of UPI, NEFT, RTGS, IMPS, Cash, Cheque, `other` or empty.
    #[serde(default)]
    pub payment_mode: String,
    /// Free-text mode used when `payment_mode` is `other` or empty.
    #[serde(default)]
    pub custom_mode: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub payment_type: PaymentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl PaymentDraft {
    pub fn new(amount: Decimal, payment_date: NaiveDate) -> Self {
        Self {
            amount,
            payment_date,
            payment_mode: String::new(),
            custom_mode: String::new(),
            reference: String::new(),
            notes: String::new(),
            status: PaymentStatus::default(),
            payment_type: PaymentType::default(),
            due_date: None,
        }
    }

    /// The mode sent to the backend: the custom mode replaces an empty or `other` selection.
    pub fn effective_mode(&self) -> String {
        let unselected = self.payment_mode.is_empty() || self.payment_mode == "other";
        if unselected && !self.custom_mode.is_empty() {
            self.custom_mode.clone()
        } else {
            self.payment_mode.clone()
        }
    }
}

/// One participant of a payment as the backend receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyPayload {
    pub party_type: PartyType,
    pub party_id: Option<PartyId>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub percentage: Option<Decimal>,
}

impl From<&PartyShare> for PartyPayload {
    fn from(share: &PartyShare) -> Self {
        Self {
            party_type: share.party_type,
            party_id: share.party_id,
            amount: share.amount.map(crate::currency::round_amount),
            percentage: share.percentage,
        }
    }
}

/// Body of `POST /api/payments/{deal_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_mode: String,
    pub reference: String,
    pub notes: String,
    pub status: PaymentStatus,
    pub payment_type: PaymentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub parties: Vec<PartyPayload>,
}

impl PaymentRequest {
    pub fn new(draft: &PaymentDraft, split: &FinalizedSplit) -> Self {
        Self {
            amount: split.payment_total,
            payment_date: draft.payment_date,
            payment_mode: draft.effective_mode(),
            reference: draft.reference.clone(),
            notes: draft.notes.clone(),
            status: draft.status.for_backend(),
            payment_type: draft.payment_type,
            due_date: draft.due_date,
            parties: split.parties.clone(),
        }
    }
}

/// Body of `POST /api/payments/{deal_id}/investor-to-owner`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorToOwnerRequest {
    pub investor_id: PartyId,
    pub owner_id: PartyId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_mode: String,
    pub reference: String,
    pub notes: String,
    pub status: PaymentStatus,
}

impl InvestorToOwnerRequest {
    pub fn new(
        draft: &PaymentDraft,
        split: &FinalizedSplit,
        investor_id: PartyId,
        owner_id: PartyId,
    ) -> Self {
        let mode = draft.effective_mode();
        Self {
            investor_id,
            owner_id,
            amount: split.payment_total,
            payment_date: draft.payment_date,
            payment_mode: if mode.is_empty() { "cash".to_string() } else { mode },
            reference: draft.reference.clone(),
            notes: draft.notes.clone(),
            status: draft.status.for_backend(),
        }
    }
}

/// Which endpoint a finalized split is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRoute {
    Standard,
    /// Exactly one listed investor paying exactly one listed owner; tracked separately.
    InvestorToOwner { investor_id: PartyId, owner_id: PartyId },
}

impl SubmitRoute {
    pub fn for_parties(parties: &[PartyPayload]) -> SubmitRoute {
        if parties.len() != 2 {
            return SubmitRoute::Standard;
        }
        let listed = |kind: PartyType| {
            parties
                .iter()
                .find(|p| p.party_type == kind)
                .and_then(|p| p.party_id)
        };
        match (listed(PartyType::Investor), listed(PartyType::Owner)) {
            (Some(investor_id), Some(owner_id)) => SubmitRoute::InvestorToOwner {
                investor_id,
                owner_id,
            },
            _ => SubmitRoute::Standard,
        }
    }
}

/// Success body of both payment endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCreated {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub payment_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn finalized(parties: Vec<PartyPayload>) -> FinalizedSplit {
        FinalizedSplit {
            payment_total: dec!(1000.00),
            parties,
            force: false,
            warnings: vec![],
        }
    }

    fn payload(kind: PartyType, id: Option<u64>) -> PartyPayload {
        PartyPayload {
            party_type: kind,
            party_id: id.map(PartyId),
            amount: Some(dec!(500)),
            percentage: Some(dec!(50)),
        }
    }

    #[test]
    fn test_paid_is_sent_as_completed() {
        assert_eq!(PaymentStatus::Paid.for_backend(), PaymentStatus::Completed);
        assert_eq!(PaymentStatus::Pending.for_backend(), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::Overdue.for_backend(), PaymentStatus::Overdue);
    }

    #[test]
    fn test_status_wire_names() {
        let overdue: PaymentStatus = serde_json::from_str("\"overdue\"").unwrap();
        assert_eq!(overdue, PaymentStatus::Overdue);
        assert_eq!(serde_json::to_value(PaymentStatus::Cancelled).unwrap(), "cancelled");
        assert_eq!(serde_json::to_value(PaymentStatus::Paid.for_backend()).unwrap(), "completed");
    }

    #[test]
    fn test_custom_mode_replaces_other() {
        let mut draft = PaymentDraft::new(dec!(10), date());
        draft.custom_mode = "Demand draft".to_string();
        assert_eq!(draft.effective_mode(), "Demand draft");
        draft.payment_mode = "other".to_string();
        assert_eq!(draft.effective_mode(), "Demand draft");
        draft.payment_mode = "UPI".to_string();
        assert_eq!(draft.effective_mode(), "UPI");
    }

    #[test]
    fn test_request_json_shape() {
        let mut draft = PaymentDraft::new(dec!(1000), date());
        draft.status = PaymentStatus::Paid;
        draft.payment_type = PaymentType::LandPurchase;
        let split = finalized(vec![
            payload(PartyType::Owner, Some(1)),
            PartyPayload {
                party_type: PartyType::Other,
                party_id: None,
                amount: None,
                percentage: Some(dec!(50)),
            },
        ]);
        let json = serde_json::to_value(PaymentRequest::new(&draft, &split)).unwrap();
        assert_eq!(json["amount"], serde_json::json!(1000.0));
        assert_eq!(json["payment_date"], "2024-03-15");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["payment_type"], "land_purchase");
        assert!(json.get("due_date").is_none());
        assert_eq!(json["parties"][0]["party_type"], "owner");
        assert_eq!(json["parties"][0]["party_id"], 1);
        assert_eq!(json["parties"][0]["amount"], serde_json::json!(500.0));
        assert!(json["parties"][1]["party_id"].is_null());
        assert!(json["parties"][1]["amount"].is_null());
    }

    #[test]
    fn test_route_investor_to_owner() {
        let parties = vec![
            payload(PartyType::Investor, Some(9)),
            payload(PartyType::Owner, Some(1)),
        ];
        assert_eq!(
            SubmitRoute::for_parties(&parties),
            SubmitRoute::InvestorToOwner {
                investor_id: PartyId(9),
                owner_id: PartyId(1)
            }
        );
    }

    #[test]
    fn test_route_standard_otherwise() {
        let three = vec![
            payload(PartyType::Investor, Some(9)),
            payload(PartyType::Owner, Some(1)),
            payload(PartyType::Owner, Some(2)),
        ];
        assert_eq!(SubmitRoute::for_parties(&three), SubmitRoute::Standard);

        let unlisted = vec![
            payload(PartyType::Investor, None),
            payload(PartyType::Owner, Some(1)),
        ];
        assert_eq!(SubmitRoute::for_parties(&unlisted), SubmitRoute::Standard);

        let owners = vec![
            payload(PartyType::Owner, Some(2)),
            payload(PartyType::Owner, Some(1)),
        ];
        assert_eq!(SubmitRoute::for_parties(&owners), SubmitRoute::Standard);
    }

    #[test]
    fn test_investor_to_owner_defaults_to_cash() {
        let draft = PaymentDraft::new(dec!(1000), date());
        let split = finalized(vec![]);
        let req = InvestorToOwnerRequest::new(&draft, &split, PartyId(9), PartyId(1));
        assert_eq!(req.payment_mode, "cash");
        assert_eq!(req.amount, dec!(1000.00));
    }
}
