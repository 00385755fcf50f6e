//! Domain traits defining contracts for the external services.
//!
//! Envelopes cross these seams as base64 XDR so that implementations stay
//! independent of how transactions are assembled.

use async_trait::async_trait;

use super::error::AppError;
use super::types::{AccountState, FundingOutcome, RouterRecord, SimulationResult, TrackedStatus};

/// Anything that can report the status of a submitted transaction
#[async_trait]
pub trait TransactionTracker: Send + Sync {
    /// Look up a transaction by hex hash
    async fn transaction_status(&self, hash: &str) -> Result<TrackedStatus, AppError>;
}

/// Ledger-facing service (Horizon style)
#[async_trait]
pub trait SubmitAndTrack: TransactionTracker {
    /// Load current sequence number and balances
    async fn load_account(&self, account_id: &str) -> Result<AccountState, AppError>;

    /// Submit a signed envelope, returning its hash once accepted for processing
    async fn submit(&self, envelope_xdr: &str) -> Result<String, AppError>;
}

/// Contract-execution RPC service (Soroban RPC style)
#[async_trait]
pub trait InvokeAndTrack: TransactionTracker {
    /// Load current sequence number of an account
    async fn load_account(&self, account_id: &str) -> Result<AccountState, AppError>;

    /// Estimate resources for an unsigned transaction envelope.
    /// Must run before signing.
    async fn simulate(&self, envelope_xdr: &str) -> Result<SimulationResult, AppError>;

    /// Send a prepared and signed envelope, returning its hash
    async fn send(&self, envelope_xdr: &str) -> Result<String, AppError>;
}

/// Test-network faucet
#[async_trait]
pub trait Faucet: Send + Sync {
    async fn fund(&self, public_key: &str) -> Result<FundingOutcome, AppError>;
}

/// Source of router contract addresses per network
#[async_trait]
pub trait RouterDirectory: Send + Sync {
    async fn routers(&self) -> Result<Vec<RouterRecord>, AppError>;
}
