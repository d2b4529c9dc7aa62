use std::sync::Arc;

use landdeal_common::api::{ApiError, PaymentApi};
use landdeal_common::party::DealParticipants;
use landdeal_common::payment::{DealId, InvestorToOwnerRequest, PaymentCreated, PaymentRequest};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::cache::ResponseCache;
use crate::config::Config;

/// `PaymentApi` over the land-deals REST backend.
pub struct HttpPaymentApi {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
    cache: Arc<dyn ResponseCache>,
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

fn roster_key(deal_id: DealId) -> String {
    format!("deal:{deal_id}")
}

impl HttpPaymentApi {
    pub fn new(config: &Config, cache: Arc<dyn ResponseCache>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            token: config.token.clone(),
            cache,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.api_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = self.authorized(request).send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        if !status.is_success() {
            let err = ApiError::from_response(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                &body,
            );
            tracing::debug!(status = status.as_u16(), error = %err, "backend rejected request");
            return Err(err);
        }
        Ok(body)
    }

    fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl PaymentApi for HttpPaymentApi {
    async fn deal_participants(&self, deal_id: DealId) -> Result<DealParticipants, ApiError> {
        let key = roster_key(deal_id);
        if let Some(body) = self.cache.get(&key) {
            match Self::decode(&body) {
                Ok(roster) => {
                    tracing::debug!(%deal_id, "deal roster served from cache");
                    return Ok(roster);
                }
                Err(err) => {
                    tracing::warn!(%deal_id, error = %err, "dropping unreadable cached roster");
                    self.cache.invalidate(&key);
                }
            }
        }

        let body = self
            .send(self.http.get(self.url(&format!("/deals/{deal_id}"))))
            .await?;
        let roster = Self::decode(&body)?;
        self.cache.put(&key, body);
        Ok(roster)
    }

    async fn create_payment(
        &self,
        deal_id: DealId,
        request: &PaymentRequest,
        force: bool,
    ) -> Result<PaymentCreated, ApiError> {
        let mut url = self.url(&format!("/payments/{deal_id}"));
        if force {
            url.push_str("?force=true");
        }
        let body = self.send(self.http.post(url).json(request)).await?;
        self.cache.invalidate(&roster_key(deal_id));
        Self::decode(&body)
    }

    async fn create_investor_to_owner_payment(
        &self,
        deal_id: DealId,
        request: &InvestorToOwnerRequest,
    ) -> Result<PaymentCreated, ApiError> {
        let url = self.url(&format!("/payments/{deal_id}/investor-to-owner"));
        let body = self.send(self.http.post(url).json(request)).await?;
        self.cache.invalidate(&roster_key(deal_id));
        Self::decode(&body)
    }
}
