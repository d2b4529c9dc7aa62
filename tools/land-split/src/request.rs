use std::path::{Path, PathBuf};

use landdeal_common::error::SplitError;
use landdeal_common::form::SplitForm;
use landdeal_common::party::PartyShare;
use landdeal_common::payment::{DealId, PaymentDraft};
use landdeal_common::split::SplitConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not a valid split request: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// A payment split described in a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRequest {
    pub deal_id: DealId,
    pub payment: PaymentDraft,
    /// Overrides `payment.custom_mode` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_mode: Option<String>,
    #[serde(default)]
    pub parties: Vec<PartyShare>,
    #[serde(default)]
    pub force: bool,
}

impl SplitRequest {
    pub fn load(path: &Path) -> Result<Self, RequestError> {
        let text = std::fs::read_to_string(path).map_err(|source| RequestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| RequestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The payment details with the top-level custom mode folded in.
    pub fn draft(&self) -> PaymentDraft {
        let mut draft = self.payment.clone();
        if let Some(mode) = &self.custom_mode {
            draft.custom_mode = mode.clone();
        }
        draft
    }

    /// A split form loaded with this request's total and parties.
    ///
    /// `force` is set when either the file or the caller asks for it.
    pub fn form(&self, config: SplitConfig, force: bool) -> Result<SplitForm, SplitError> {
        let mut form = SplitForm::with_parties(config, Some(self.payment.amount), self.parties.clone());
        if force || self.force {
            form.set_force(true)?;
        }
        Ok(form)
    }
}
