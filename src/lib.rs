//! Thin client for Stellar payments, classic liquidity pools and the
//! Soroswap router.
//!
//! Transactions are assembled and signed locally, submitted to Horizon or
//! Soroban RPC, and awaited until the ledger reports a terminal status.

pub mod app;
pub mod domain;
pub mod infra;
pub mod tx;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::{ClientConfig, ConfirmationPoller, PollPolicy, SoroswapClient};
pub use domain::{
    AppError, AssetRef, ConfigError, FundingOutcome, LiquidityPoolAsset, Network, TestAccount,
    TransportError, TxOutcome, ValidationError,
};
pub use tx::{AddLiquidityArgs, RemoveLiquidityArgs, SwapArgs, SwapKind};
