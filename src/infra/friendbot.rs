//! Friendbot faucet for test networks.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::http::{build_http_client, normalize_base_url};
use crate::domain::{AppError, Faucet, FundingOutcome};

/// Detail returned by Friendbot when the account has already been created
pub const ACCOUNT_ALREADY_EXISTS: &str =
    "createAccountAlreadyExist (AAAAAAAAAGT/////AAAAAQAAAAAAAAAA/////AAAAAAAAAAA=)";

#[derive(Debug, Default, Deserialize)]
struct FriendbotResponse {
    #[serde(default)]
    successful: Option<bool>,
    #[serde(default)]
    detail: Option<String>,
}

impl FriendbotResponse {
    fn into_outcome(self, status: u16) -> FundingOutcome {
        if self.successful == Some(true) {
            return FundingOutcome::Funded;
        }
        match self.detail {
            Some(detail) if detail == ACCOUNT_ALREADY_EXISTS => FundingOutcome::AlreadyFunded,
            Some(detail) => FundingOutcome::Error { error: detail },
            None => FundingOutcome::Error {
                error: format!("Friendbot returned status {} without detail", status),
            },
        }
    }
}

pub struct FriendbotFaucet {
    http_client: Client,
    url: String,
}

impl FriendbotFaucet {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            url: normalize_base_url(url),
        })
    }
}

#[async_trait]
impl Faucet for FriendbotFaucet {
    #[instrument(skip(self))]
    async fn fund(&self, public_key: &str) -> Result<FundingOutcome, AppError> {
        let response = self
            .http_client
            .get(&self.url)
            .query(&[("addr", public_key)])
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        let parsed: FriendbotResponse = serde_json::from_str(&body).unwrap_or_default();

        let outcome = parsed.into_outcome(status);
        match &outcome {
            FundingOutcome::Funded => info!(public_key = %public_key, "Account funded"),
            FundingOutcome::AlreadyFunded => {
                info!(public_key = %public_key, "Account already exists, nothing to fund")
            }
            FundingOutcome::Error { error } => {
                warn!(public_key = %public_key, status, error = %error, "Friendbot funding failed")
            }
        }
        Ok(outcome)
    }
}
