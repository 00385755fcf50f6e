//! Horizon REST client: the ledger-facing Submit-and-Track service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::http::{build_http_client, decode_json, ensure_success, normalize_base_url};
use crate::domain::{
    AccountState, AppError, Balance, SubmitAndTrack, TrackedStatus, TransactionTracker,
    TransportError,
};
use crate::tx::results::{ledger_record, rejection_detail};

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account_id: String,
    /// Horizon serializes sequence numbers as strings
    sequence: String,
    #[serde(default)]
    balances: Vec<Balance>,
}

#[derive(Debug, Deserialize)]
struct AsyncSubmitResponse {
    #[serde(default)]
    hash: Option<String>,
    tx_status: String,
    #[serde(default)]
    error_result_xdr: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    hash: String,
    successful: bool,
    #[serde(default)]
    ledger: Option<u32>,
    #[serde(default)]
    result_xdr: Option<String>,
}

impl From<TransactionResponse> for TrackedStatus {
    fn from(tx: TransactionResponse) -> Self {
        let record = ledger_record(&tx.hash, tx.ledger, tx.result_xdr);
        if tx.successful {
            Self::Success(record)
        } else {
            Self::Failed(record)
        }
    }
}

/// Client for a Horizon instance
pub struct HorizonClient {
    http_client: Client,
    base_url: String,
}

impl HorizonClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TransactionTracker for HorizonClient {
    #[instrument(skip(self))]
    async fn transaction_status(&self, hash: &str) -> Result<TrackedStatus, AppError> {
        let url = format!("{}/transactions/{}", self.base_url, hash);
        let response = self.http_client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(hash = %hash, "Transaction not yet observed");
            return Ok(TrackedStatus::NotFound);
        }
        let tx: TransactionResponse = decode_json(ensure_success(response).await?).await?;
        Ok(tx.into())
    }
}

#[async_trait]
impl SubmitAndTrack for HorizonClient {
    #[instrument(skip(self))]
    async fn load_account(&self, account_id: &str) -> Result<AccountState, AppError> {
        let url = format!("{}/accounts/{}", self.base_url, account_id);
        let response = self.http_client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::Transport(TransportError::AccountNotFound(
                account_id.to_string(),
            )));
        }
        let account: AccountResponse = decode_json(ensure_success(response).await?).await?;
        let sequence = account.sequence.parse::<i64>().map_err(|e| {
            AppError::Transport(TransportError::Decode(format!(
                "sequence {:?}: {}",
                account.sequence, e
            )))
        })?;
        debug!(account_id = %account.account_id, sequence, "Loaded account");
        Ok(AccountState {
            account_id: account.account_id,
            sequence,
            balances: account.balances,
        })
    }

    #[instrument(skip(self, envelope_xdr))]
    async fn submit(&self, envelope_xdr: &str) -> Result<String, AppError> {
        let url = format!("{}/transactions_async", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .form(&[("tx", envelope_xdr)])
            .send()
            .await?;

        // Rejections come back as 4xx with the same body shape, so decode
        // before looking at the status code.
        let status = response.status();
        let body = response.text().await?;
        let parsed: AsyncSubmitResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(AppError::Transport(TransportError::Status {
                    status: status.as_u16(),
                    body,
                }));
            }
            Err(e) => return Err(AppError::Transport(TransportError::Decode(e.to_string()))),
        };

        match (parsed.tx_status.as_str(), parsed.hash) {
            ("PENDING" | "DUPLICATE", Some(hash)) => {
                info!(hash = %hash, status = %parsed.tx_status, "Transaction submitted");
                Ok(hash)
            }
            (other, _) => {
                let detail = rejection_detail(parsed.error_result_xdr);
                warn!(status = %other, detail = %detail, "Submission rejected");
                Err(AppError::Transport(TransportError::Rejected {
                    status: other.to_string(),
                    detail,
                }))
            }
        }
    }
}
