//! Mock implementations for testing.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::domain::{
    AccountState, AppError, Faucet, FundingOutcome, InvokeAndTrack, SimulationResult,
    SubmitAndTrack, TrackedStatus, TransactionTracker, TransportError, TxRecord,
};

/// Base64 `SorobanTransactionData` with 1000 instructions and a 5000 stroop resource fee
pub const MOCK_TRANSACTION_DATA: &str = "AAAAAAAAAAAAAAAAAAAD6AAAAAAAAAAAAAAAAAAAE4g=";
pub const MOCK_RESOURCE_FEE: i64 = 5000;

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }
}

/// In-memory ledger standing in for Horizon, Soroban RPC and Friendbot at once.
///
/// Transaction lookups replay the scripted statuses first and report success
/// once the script is exhausted. A failing config makes submissions fail.
pub struct MockLedger {
    config: MockConfig,
    accounts: Mutex<HashMap<String, AccountState>>,
    statuses: Mutex<VecDeque<TrackedStatus>>,
    simulation: Mutex<Result<SimulationResult, String>>,
    funding: Mutex<FundingOutcome>,
    submitted: Mutex<Vec<String>>,
    simulated: Mutex<Vec<String>>,
    sent: Mutex<Vec<String>>,
    status_calls: AtomicUsize,
    account_latency: Mutex<Option<Duration>>,
}

impl MockLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            accounts: Mutex::new(HashMap::new()),
            statuses: Mutex::new(VecDeque::new()),
            simulation: Mutex::new(Ok(SimulationResult {
                transaction_data: MOCK_TRANSACTION_DATA.to_string(),
                min_resource_fee: MOCK_RESOURCE_FEE,
                auth: Vec::new(),
                latest_ledger: Some(100),
            })),
            funding: Mutex::new(FundingOutcome::Funded),
            submitted: Mutex::new(Vec::new()),
            simulated: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
            account_latency: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Register an account with a known sequence number
    pub fn add_account(&self, state: AccountState) {
        self.accounts
            .lock()
            .unwrap()
            .insert(state.account_id.clone(), state);
    }

    /// Queue statuses returned by the next lookups
    pub fn push_statuses(&self, statuses: impl IntoIterator<Item = TrackedStatus>) {
        self.statuses.lock().unwrap().extend(statuses);
    }

    pub fn set_simulation(&self, simulation: Result<SimulationResult, String>) {
        *self.simulation.lock().unwrap() = simulation;
    }

    /// Delay every account load by `latency`
    pub fn set_account_latency(&self, latency: Duration) {
        *self.account_latency.lock().unwrap() = Some(latency);
    }

    pub fn set_funding_outcome(&self, outcome: FundingOutcome) {
        *self.funding.lock().unwrap() = outcome;
    }

    /// Envelopes received through Horizon-style submission
    pub fn submitted_envelopes(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    /// Unsigned envelopes received for simulation
    pub fn simulated_envelopes(&self) -> Vec<String> {
        self.simulated.lock().unwrap().clone()
    }

    /// Envelopes received through RPC `send`
    pub fn sent_envelopes(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock error".to_string());
            return Err(AppError::Transport(TransportError::Http(msg)));
        }
        Ok(())
    }

    async fn load(&self, account_id: &str) -> AccountState {
        let latency = *self.account_latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.account(account_id)
    }

    fn account(&self, account_id: &str) -> AccountState {
        self.accounts
            .lock()
            .unwrap()
            .entry(account_id.to_string())
            .or_insert_with(|| AccountState::new(account_id, 1))
            .clone()
    }

    fn accept(&self, log: &Mutex<Vec<String>>, envelope_xdr: &str) -> Result<String, AppError> {
        self.check_should_fail()?;
        log.lock().unwrap().push(envelope_xdr.to_string());
        Ok(hex::encode(Sha256::digest(envelope_xdr.as_bytes())))
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionTracker for MockLedger {
    async fn transaction_status(&self, hash: &str) -> Result<TrackedStatus, AppError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.statuses.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| {
            TrackedStatus::Success(TxRecord {
                hash: hash.to_string(),
                ledger: Some(1),
                ..Default::default()
            })
        }))
    }
}

#[async_trait]
impl SubmitAndTrack for MockLedger {
    async fn load_account(&self, account_id: &str) -> Result<AccountState, AppError> {
        Ok(self.load(account_id).await)
    }

    async fn submit(&self, envelope_xdr: &str) -> Result<String, AppError> {
        self.accept(&self.submitted, envelope_xdr)
    }
}

#[async_trait]
impl InvokeAndTrack for MockLedger {
    async fn load_account(&self, account_id: &str) -> Result<AccountState, AppError> {
        Ok(self.load(account_id).await)
    }

    async fn simulate(&self, envelope_xdr: &str) -> Result<SimulationResult, AppError> {
        self.simulated
            .lock()
            .unwrap()
            .push(envelope_xdr.to_string());
        self.simulation
            .lock()
            .unwrap()
            .clone()
            .map_err(|e| AppError::Validation(crate::domain::ValidationError::Simulation(e)))
    }

    async fn send(&self, envelope_xdr: &str) -> Result<String, AppError> {
        self.accept(&self.sent, envelope_xdr)
    }
}

#[async_trait]
impl Faucet for MockLedger {
    async fn fund(&self, _public_key: &str) -> Result<FundingOutcome, AppError> {
        if self.config.should_fail {
            return Err(AppError::Transport(TransportError::ExternalService(
                "faucet unavailable".to_string(),
            )));
        }
        Ok(self.funding.lock().unwrap().clone())
    }
}
