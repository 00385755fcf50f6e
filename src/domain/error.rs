//! Error taxonomy for the client.
//!
//! Configuration errors are fatal and surface at construction time. Transport
//! and validation errors are recoverable and are converted into a uniform
//! error outcome by the client facade.

use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cancelled before submission; nothing was sent")]
    CancelledBeforeSubmission,

    #[error("Confirmation of transaction {0} was cancelled")]
    Cancelled(String),
}

impl AppError {
    /// Configuration errors must never be retried or converted into a result.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Hash of a transaction that reached the ledger service before the
    /// wait for it was abandoned. Its fate is unknown, not failed.
    pub fn submitted_hash(&self) -> Option<&str> {
        match self {
            Self::Cancelled(hash)
            | Self::Transport(TransportError::ConfirmationTimeout { hash, .. }) => Some(hash),
            _ => None,
        }
    }
}

/// Fatal configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported network: {0} (expected `standalone` or `testnet`)")]
    UnsupportedNetwork(String),

    #[error("Missing configuration value: {0}")]
    Missing(String),

    #[error("Invalid configuration value for {name}: {reason}")]
    Invalid { name: String, reason: String },

    #[error("No router registered for network {0}")]
    RouterNotFound(String),
}

/// Recoverable failures talking to the ledger-facing services
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Submission rejected ({status}): {detail}")]
    Rejected { status: String, detail: String },

    #[error("Transaction {hash} not confirmed within {waited_secs}s")]
    ConfirmationTimeout { hash: String, waited_secs: u64 },

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}

/// Malformed input or unexpected ledger data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid secret key")]
    InvalidSecret,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    #[error("Hex string has odd length {0}")]
    OddLengthHex(usize),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("A transaction needs at least one operation")]
    EmptyOperations,

    #[error("XDR error: {0}")]
    Xdr(String),

    #[error("Simulation failed: {0}")]
    Simulation(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),
}

impl From<stellar_xdr::curr::Error> for ValidationError {
    fn from(e: stellar_xdr::curr::Error) -> Self {
        Self::Xdr(e.to_string())
    }
}

impl From<stellar_xdr::curr::Error> for AppError {
    fn from(e: stellar_xdr::curr::Error) -> Self {
        Self::Validation(e.into())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.into())
    }
}
