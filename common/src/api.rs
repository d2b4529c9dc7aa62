use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::FinalizedSplit;
use crate::party::DealParticipants;
use crate::payment::{
    DealId, InvestorToOwnerRequest, PaymentCreated, PaymentDraft, PaymentRequest, SubmitRoute,
};

/// Errors from the payment backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The backend re-added the party amounts and they do not match the payment.
    #[error("Party sum mismatch: payment {payment_amount} vs parties {parties_total}")]
    PartyAmountMismatch {
        payment_amount: Decimal,
        parties_total: Decimal,
    },
    /// The backend re-added the party percentages and they do not reach 100.
    #[error("Party percentage mismatch: total {total_percentage}")]
    PartyPercentageMismatch { total_percentage: Decimal },
    #[error("{status}: {message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Error body the backend sends with a non-success status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_amount: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub parties_total: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_percentage: Option<Decimal>,
}

pub const PARTY_AMOUNT_MISMATCH: &str = "party_amount_mismatch";
pub const PARTY_PERCENTAGE_MISMATCH: &str = "party_percentage_mismatch";

impl ApiError {
    /// Interpret a non-success response.
    ///
    /// `reason` is the status text, used when the body names no error.
    pub fn from_response(status: u16, reason: &str, body: &str) -> ApiError {
        let fallback = || {
            if reason.is_empty() {
                format!("Server error {status}")
            } else {
                reason.to_string()
            }
        };
        let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
            return ApiError::Status {
                status,
                message: fallback(),
            };
        };
        let code = parsed.error.as_deref().unwrap_or_default();
        if code == PARTY_AMOUNT_MISMATCH {
            return ApiError::PartyAmountMismatch {
                payment_amount: parsed.payment_amount.unwrap_or_default(),
                parties_total: parsed.parties_total.unwrap_or_default(),
            };
        }
        // older backends put the message where the code belongs
        let percentage_message = code.to_ascii_lowercase().starts_with("party percentage mismatch");
        if code == PARTY_PERCENTAGE_MISMATCH || (percentage_message && parsed.total_percentage.is_some()) {
            return ApiError::PartyPercentageMismatch {
                total_percentage: parsed.total_percentage.unwrap_or_default(),
            };
        }
        let message = parsed
            .error
            .filter(|e| !e.is_empty())
            .or(parsed.message)
            .unwrap_or_else(fallback);
        ApiError::Status { status, message }
    }

    /// Server-side re-validation rejected the split.
    pub fn is_party_mismatch(&self) -> bool {
        matches!(
            self,
            ApiError::PartyAmountMismatch { .. } | ApiError::PartyPercentageMismatch { .. }
        )
    }
}

/// The land-deals REST backend, as far as the payment form needs it.
#[allow(async_fn_in_trait)]
pub trait PaymentApi {
    /// Owners, investors and buyers attached to a deal.
    async fn deal_participants(&self, deal_id: DealId) -> Result<DealParticipants, ApiError>;

    /// Create a payment with its parties. `force` skips the backend's mismatch check.
    async fn create_payment(
        &self,
        deal_id: DealId,
        request: &PaymentRequest,
        force: bool,
    ) -> Result<PaymentCreated, ApiError>;

    /// Record an investor paying an owner, tracked against both.
    async fn create_investor_to_owner_payment(
        &self,
        deal_id: DealId,
        request: &InvestorToOwnerRequest,
    ) -> Result<PaymentCreated, ApiError>;
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub route: SubmitRoute,
    pub created: PaymentCreated,
    /// The investor-to-owner endpoint failed and the regular one was used.
    pub fell_back: bool,
}

/// Send a finalized split to the backend.
///
/// Investor-to-owner payments go to their own endpoint first. If that fails for
/// any reason other than a party mismatch, the payment is created through the
/// regular endpoint instead.
pub async fn submit_payment<A: PaymentApi>(
    api: &A,
    deal_id: DealId,
    draft: &PaymentDraft,
    split: &FinalizedSplit,
) -> Result<Submission, ApiError> {
    let route = SubmitRoute::for_parties(&split.parties);
    let mut fell_back = false;
    if let SubmitRoute::InvestorToOwner {
        investor_id,
        owner_id,
    } = route
    {
        let request = InvestorToOwnerRequest::new(draft, split, investor_id, owner_id);
        match api.create_investor_to_owner_payment(deal_id, &request).await {
            Ok(created) => {
                tracing::info!(%deal_id, payment_id = ?created.payment_id, "investor to owner payment recorded");
                return Ok(Submission {
                    route,
                    created,
                    fell_back,
                });
            }
            Err(err) if err.is_party_mismatch() => return Err(err),
            Err(err) => {
                tracing::warn!(%deal_id, error = %err, "investor to owner endpoint failed, using regular payment creation");
                fell_back = true;
            }
        }
    }

    let request = PaymentRequest::new(draft, split);
    let created = api.create_payment(deal_id, &request, split.force).await?;
    tracing::info!(%deal_id, payment_id = ?created.payment_id, force = split.force, "payment recorded");
    Ok(Submission {
        route,
        created,
        fell_back,
    })
}
