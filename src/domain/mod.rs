//! Domain layer containing core types, traits, and error definitions.

pub mod error;
pub mod network;
pub mod traits;
pub mod types;

pub use error::{AppError, ConfigError, TransportError, ValidationError};
pub use network::{Network, network_passphrase};
pub use traits::{Faucet, InvokeAndTrack, RouterDirectory, SubmitAndTrack, TransactionTracker};
pub use types::{
    AccountState, AssetRef, Balance, Confirmation, FundingOutcome, LiquidityPoolAsset,
    PoolFeeModel, ResultCodes, RouterRecord, SimulationResult, TestAccount, TrackedStatus,
    TxOutcome, TxRecord,
};
