//! Soroban RPC client: the contract-execution Invoke-and-Track service.
//!
//! Speaks JSON-RPC 2.0 over HTTP. The transport sits behind
//! [`RpcTransport`] so the client can be exercised with scripted responses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, instrument, warn};

use stellar_xdr::curr::{LedgerEntryData, LedgerKey, LedgerKeyAccount};

use super::http::{build_http_client, ensure_success, normalize_base_url};
use crate::domain::{
    AccountState, AppError, Balance, InvokeAndTrack, SimulationResult, TrackedStatus,
    TransactionTracker, TransportError, ValidationError,
};
use crate::tx::amount::stroops_to_string;
use crate::tx::encoding::{from_base64_xdr, to_base64_xdr};
use crate::tx::keys::account_id;
use crate::tx::results::{ledger_record, rejection_detail};

/// Sends raw JSON-RPC requests
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn send_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, AppError>;
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<T: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    params: T,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// JSON-RPC over HTTP POST
pub struct HttpRpcTransport {
    http_client: Client,
    rpc_url: String,
}

impl HttpRpcTransport {
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            rpc_url: normalize_base_url(rpc_url),
        })
    }
}

#[async_trait]
impl RpcTransport for HttpRpcTransport {
    async fn send_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, AppError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: method.to_string(),
            params,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?;

        let rpc_response: JsonRpcResponse<serde_json::Value> = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Transport(TransportError::Decode(e.to_string())))?;

        if let Some(error) = rpc_response.error {
            return Err(AppError::Transport(TransportError::Rpc {
                code: error.code,
                message: error.message,
            }));
        }

        rpc_response
            .result
            .ok_or_else(|| AppError::Transport(TransportError::Decode("Empty response".to_string())))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerEntriesResult {
    #[serde(default)]
    entries: Option<Vec<LedgerEntryResult>>,
}

#[derive(Debug, Deserialize)]
struct LedgerEntryResult {
    xdr: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResult {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    transaction_data: Option<String>,
    #[serde(default)]
    min_resource_fee: Option<String>,
    #[serde(default)]
    results: Vec<SimulateHostFunctionResult>,
    #[serde(default)]
    latest_ledger: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SimulateHostFunctionResult {
    #[serde(default)]
    auth: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResult {
    status: String,
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    error_result_xdr: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetTransactionResult {
    status: String,
    #[serde(default)]
    ledger: Option<u32>,
    #[serde(default)]
    result_xdr: Option<String>,
}

impl TryFrom<SimulateResult> for SimulationResult {
    type Error = ValidationError;

    fn try_from(sim: SimulateResult) -> Result<Self, Self::Error> {
        if let Some(error) = sim.error {
            return Err(ValidationError::Simulation(error));
        }
        let transaction_data = sim
            .transaction_data
            .ok_or_else(|| ValidationError::Simulation("missing transactionData".to_string()))?;
        let min_resource_fee = sim
            .min_resource_fee
            .as_deref()
            .unwrap_or("0")
            .parse::<i64>()
            .map_err(|e| ValidationError::Simulation(format!("minResourceFee: {}", e)))?;
        let auth = sim
            .results
            .into_iter()
            .next()
            .map(|r| r.auth)
            .unwrap_or_default();
        Ok(Self {
            transaction_data,
            min_resource_fee,
            auth,
            latest_ledger: sim.latest_ledger,
        })
    }
}

/// Soroban RPC client
pub struct SorobanRpcClient {
    provider: Box<dyn RpcTransport>,
}

impl SorobanRpcClient {
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let provider = HttpRpcTransport::new(rpc_url, timeout)?;
        info!(rpc_url = %rpc_url, "Created Soroban RPC client");
        Ok(Self::with_provider(Box::new(provider)))
    }

    /// Create a client with a specific transport (useful for testing)
    pub fn with_provider(provider: Box<dyn RpcTransport>) -> Self {
        Self { provider }
    }

    /// Single RPC call. Transport failures are returned as-is; there is no retry.
    #[instrument(skip(self, params))]
    async fn rpc_call<P: Serialize + Send + Sync, R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, AppError> {
        let params_value = serde_json::to_value(params).map_err(|e| {
            AppError::Transport(TransportError::Decode(format!("Serialization error: {}", e)))
        })?;
        let result_value = self.provider.send_request(method, params_value).await?;
        serde_json::from_value(result_value).map_err(|e| {
            AppError::Transport(TransportError::Decode(format!(
                "Deserialization error: {}",
                e
            )))
        })
    }
}

#[async_trait]
impl TransactionTracker for SorobanRpcClient {
    #[instrument(skip(self))]
    async fn transaction_status(&self, hash: &str) -> Result<TrackedStatus, AppError> {
        let result: GetTransactionResult = self
            .rpc_call("getTransaction", serde_json::json!({ "hash": hash }))
            .await?;
        let record = ledger_record(hash, result.ledger, result.result_xdr);
        match result.status.as_str() {
            "NOT_FOUND" => Ok(TrackedStatus::NotFound),
            "SUCCESS" => Ok(TrackedStatus::Success(record)),
            "FAILED" => Ok(TrackedStatus::Failed(record)),
            other => Err(AppError::Transport(TransportError::Decode(format!(
                "unknown transaction status {}",
                other
            )))),
        }
    }
}

#[async_trait]
impl InvokeAndTrack for SorobanRpcClient {
    #[instrument(skip(self))]
    async fn load_account(&self, account: &str) -> Result<AccountState, AppError> {
        let key = LedgerKey::Account(LedgerKeyAccount {
            account_id: account_id(account)?,
        });
        let result: LedgerEntriesResult = self
            .rpc_call(
                "getLedgerEntries",
                serde_json::json!({ "keys": [to_base64_xdr(&key)?] }),
            )
            .await?;

        let entry = result
            .entries
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Transport(TransportError::AccountNotFound(account.to_string())))?;

        match from_base64_xdr::<LedgerEntryData>(&entry.xdr)? {
            LedgerEntryData::Account(entry) => {
                debug!(account_id = %account, sequence = entry.seq_num.0, "Loaded account");
                Ok(AccountState {
                    account_id: account.to_string(),
                    sequence: entry.seq_num.0,
                    balances: vec![Balance {
                        asset_type: "native".to_string(),
                        balance: stroops_to_string(entry.balance),
                        asset_code: None,
                        asset_issuer: None,
                        liquidity_pool_id: None,
                    }],
                })
            }
            _ => Err(AppError::Transport(TransportError::Decode(
                "ledger entry is not an account".to_string(),
            ))),
        }
    }

    #[instrument(skip(self, envelope_xdr))]
    async fn simulate(&self, envelope_xdr: &str) -> Result<SimulationResult, AppError> {
        let result: SimulateResult = self
            .rpc_call(
                "simulateTransaction",
                serde_json::json!({ "transaction": envelope_xdr }),
            )
            .await?;
        let simulation = SimulationResult::try_from(result)?;
        debug!(
            min_resource_fee = simulation.min_resource_fee,
            auth_entries = simulation.auth.len(),
            "Simulated invocation"
        );
        Ok(simulation)
    }

    #[instrument(skip(self, envelope_xdr))]
    async fn send(&self, envelope_xdr: &str) -> Result<String, AppError> {
        let result: SendResult = self
            .rpc_call(
                "sendTransaction",
                serde_json::json!({ "transaction": envelope_xdr }),
            )
            .await?;
        match (result.status.as_str(), result.hash) {
            ("PENDING" | "DUPLICATE", Some(hash)) => {
                info!(hash = %hash, status = %result.status, "Invocation sent");
                Ok(hash)
            }
            (other, _) => {
                let detail = rejection_detail(result.error_result_xdr);
                warn!(status = %other, detail = %detail, "Invocation rejected");
                Err(AppError::Transport(TransportError::Rejected {
                    status: other.to_string(),
                    detail,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TestAccount;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use stellar_xdr::curr::{
        AccountEntry, AccountEntryExt, SequenceNumber, String32, StringM, Thresholds, VecM,
    };

    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<serde_json::Value, AppError>>>,
        calls: Mutex<Vec<(String, serde_json::Value)>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<serde_json::Value, AppError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RpcTransport for std::sync::Arc<ScriptedTransport> {
        async fn send_request(
            &self,
            method: &str,
            params: serde_json::Value,
        ) -> Result<serde_json::Value, AppError> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(serde_json::Value::Null))
        }
    }

    fn client(
        responses: Vec<Result<serde_json::Value, AppError>>,
    ) -> (SorobanRpcClient, std::sync::Arc<ScriptedTransport>) {
        let transport = std::sync::Arc::new(ScriptedTransport::new(responses));
        (
            SorobanRpcClient::with_provider(Box::new(transport.clone())),
            transport,
        )
    }

    #[tokio::test]
    async fn test_transaction_status_mapping() {
        let (rpc, _) = client(vec![
            Ok(serde_json::json!({"status": "NOT_FOUND", "latestLedger": 5})),
            Ok(serde_json::json!({"status": "SUCCESS", "ledger": 6, "resultXdr": "AAAA"})),
            Ok(serde_json::json!({
                "status": "FAILED", "ledger": 7, "resultXdr": "AAAAAAAAAGT////7AAAAAA=="
            })),
            Ok(serde_json::json!({"status": "WEIRD"})),
        ]);
        assert_eq!(rpc.transaction_status("h").await.unwrap(), TrackedStatus::NotFound);
        match rpc.transaction_status("h").await.unwrap() {
            TrackedStatus::Success(r) => {
                assert_eq!(r.ledger, Some(6));
                assert_eq!(r.result_xdr.as_deref(), Some("AAAA"));
            }
            other => panic!("expected success, got {:?}", other),
        }
        match rpc.transaction_status("h").await.unwrap() {
            TrackedStatus::Failed(r) => {
                assert_eq!(r.result_codes.unwrap().transaction, "tx_bad_seq");
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(rpc.transaction_status("h").await.is_err());
    }

    #[tokio::test]
    async fn test_transport_errors_are_not_retried() {
        let (rpc, transport) = client(vec![Err(AppError::Transport(TransportError::Timeout(
            "slow".into(),
        )))]);
        let result = rpc.transaction_status("h").await;
        assert!(matches!(
            result,
            Err(AppError::Transport(TransportError::Timeout(_)))
        ));
        assert_eq!(transport.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_simulate_parses_fee_and_auth() {
        let (rpc, transport) = client(vec![Ok(serde_json::json!({
            "transactionData": "AAAA",
            "minResourceFee": "58181",
            "results": [{"auth": ["AUTH1"], "xdr": "AAAAAQ=="}],
            "latestLedger": 1234
        }))]);
        let sim = rpc.simulate("ENVELOPE").await.unwrap();
        assert_eq!(sim.min_resource_fee, 58181);
        assert_eq!(sim.auth, vec!["AUTH1".to_string()]);
        assert_eq!(sim.latest_ledger, Some(1234));

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0].0, "simulateTransaction");
        assert_eq!(calls[0].1["transaction"], "ENVELOPE");
    }

    #[tokio::test]
    async fn test_simulate_error_is_validation_error() {
        let (rpc, _) = client(vec![Ok(serde_json::json!({
            "error": "HostError: contract trapped",
            "latestLedger": 1
        }))]);
        let err = rpc.simulate("ENVELOPE").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::Simulation(ref msg)) if msg.contains("trapped")
        ));
    }

    #[tokio::test]
    async fn test_send_statuses() {
        let (rpc, _) = client(vec![
            Ok(serde_json::json!({"status": "PENDING", "hash": "abc"})),
            Ok(serde_json::json!({"status": "ERROR", "hash": "def", "errorResultXdr": "XDR"})),
        ]);
        assert_eq!(rpc.send("E").await.unwrap(), "abc");
        match rpc.send("E").await.unwrap_err() {
            AppError::Transport(TransportError::Rejected { status, detail }) => {
                assert_eq!(status, "ERROR");
                assert_eq!(detail, "XDR");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_account_decodes_ledger_entry() {
        let account = TestAccount::random();
        let entry = LedgerEntryData::Account(AccountEntry {
            account_id: account_id(&account.public_key).unwrap(),
            balance: 100_000_000,
            seq_num: SequenceNumber(77),
            num_sub_entries: 0,
            inflation_dest: None,
            flags: 0,
            home_domain: String32(StringM::default()),
            thresholds: Thresholds([1, 0, 0, 0]),
            signers: VecM::default(),
            ext: AccountEntryExt::V0,
        });
        let (rpc, transport) = client(vec![Ok(serde_json::json!({
            "entries": [{"key": "K", "xdr": to_base64_xdr(&entry).unwrap(), "lastModifiedLedgerSeq": 3}],
            "latestLedger": 9
        }))]);

        let state = rpc.load_account(&account.public_key).await.unwrap();
        assert_eq!(state.sequence, 77);
        assert_eq!(state.balances[0].balance, "10.0000000");
        assert_eq!(transport.calls.lock().unwrap()[0].0, "getLedgerEntries");
    }

    #[tokio::test]
    async fn test_load_missing_account() {
        let account = TestAccount::random();
        let (rpc, _) = client(vec![Ok(serde_json::json!({"entries": [], "latestLedger": 9}))]);
        assert!(matches!(
            rpc.load_account(&account.public_key).await,
            Err(AppError::Transport(TransportError::AccountNotFound(_)))
        ));
    }
}
