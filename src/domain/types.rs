//! Domain value types.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::error::AppError;

/// A keypair-bearing account used to source and sign transactions.
///
/// The client never stores accounts; they are borrowed for a single call.
#[derive(Debug, Clone)]
pub struct TestAccount {
    /// StrKey-encoded public key (`G...`)
    pub public_key: String,
    /// StrKey-encoded secret seed (`S...`)
    pub secret: SecretString,
}

/// Reference to a classic ledger asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetRef {
    /// The network's base currency
    Native,
    /// An issued asset
    Credit { code: String, issuer: String },
}

impl AssetRef {
    #[must_use]
    pub fn credit(code: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self::Credit {
            code: code.into(),
            issuer: issuer.into(),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Credit { code, issuer } => write!(f, "{}:{}", code, issuer),
        }
    }
}

/// Pool fee model. Only constant product pools exist on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolFeeModel {
    #[default]
    ConstantProduct,
}

impl PoolFeeModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConstantProduct => "constant_product",
        }
    }
}

/// Asset pair describing a liquidity pool
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LiquidityPoolAsset {
    pub asset_a: AssetRef,
    pub asset_b: AssetRef,
    #[serde(default)]
    pub fee_model: PoolFeeModel,
}

/// Account state as reported by a ledger-facing service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub account_id: String,
    /// Current (last consumed) sequence number
    pub sequence: i64,
    #[serde(default)]
    pub balances: Vec<Balance>,
}

impl AccountState {
    #[must_use]
    pub fn new(account_id: impl Into<String>, sequence: i64) -> Self {
        Self {
            account_id: account_id.into(),
            sequence,
            balances: Vec::new(),
        }
    }
}

/// A single balance line of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset_type: String,
    pub balance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidity_pool_id: Option<String>,
}

/// What a tracking service knows about a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum TrackedStatus {
    /// Not yet observed in a closed ledger
    NotFound,
    Success(TxRecord),
    Failed(TxRecord),
}

/// Ledger record of a transaction in a terminal state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TxRecord {
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_xdr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_codes: Option<ResultCodes>,
}

impl TxRecord {
    #[must_use]
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            ..Default::default()
        }
    }
}

/// Transaction and per-operation result codes, in Horizon's `tx_*` / `op_*` form
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultCodes {
    pub transaction: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<String>,
}

impl std::fmt::Display for ResultCodes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.operations.is_empty() {
            write!(f, "{}", self.transaction)
        } else {
            write!(f, "{} [{}]", self.transaction, self.operations.join(", "))
        }
    }
}

/// Terminal state returned by the confirmation poller
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    Success(TxRecord),
    Failed(TxRecord),
}

impl Confirmation {
    pub fn record(&self) -> &TxRecord {
        match self {
            Self::Success(r) | Self::Failed(r) => r,
        }
    }
}

/// Uniform result of every client facade action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TxOutcome {
    Success(TxRecord),
    Failed(TxRecord),
    /// `hash` is set when the transaction was submitted but its wait was
    /// abandoned; it may still land on the ledger.
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hash: Option<String>,
    },
}

impl TxOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn hash(&self) -> Option<&str> {
        match self {
            Self::Success(r) | Self::Failed(r) => Some(&r.hash),
            Self::Error { hash, .. } => hash.as_deref(),
        }
    }
}

impl From<Confirmation> for TxOutcome {
    fn from(c: Confirmation) -> Self {
        match c {
            Confirmation::Success(r) => Self::Success(r),
            Confirmation::Failed(r) => Self::Failed(r),
        }
    }
}

impl From<Result<Confirmation, AppError>> for TxOutcome {
    fn from(result: Result<Confirmation, AppError>) -> Self {
        match result {
            Ok(c) => c.into(),
            Err(e) => Self::Error {
                error: e.to_string(),
                hash: e.submitted_hash().map(str::to_string),
            },
        }
    }
}

/// Result of asking the faucet to fund an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FundingOutcome {
    Funded,
    /// The account already existed; treated as success
    AlreadyFunded,
    Error { error: String },
}

impl FundingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Funded | Self::AlreadyFunded)
    }
}

/// Resource estimate returned by simulating a contract invocation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Base64 `SorobanTransactionData`
    pub transaction_data: String,
    /// Resource fee in stroops to add on top of the inclusion fee
    pub min_resource_fee: i64,
    /// Base64 `SorobanAuthorizationEntry` values for the first invocation
    #[serde(default)]
    pub auth: Vec<String>,
    pub latest_ledger: Option<u32>,
}

/// Entry returned by the router discovery endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterRecord {
    pub network: String,
    pub router_id: String,
    pub router_address: String,
}
