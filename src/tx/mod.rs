//! Pure transaction assembly. Nothing in this module performs I/O.

pub mod amount;
pub mod builder;
pub mod encoding;
pub mod keys;
pub mod operations;
pub mod pool;
pub mod results;
pub mod soroban;

pub use amount::{stroops_to_string, to_positive_stroops, to_stroops};
pub use builder::{SignedEnvelope, TransactionBuilder, transaction_hash};
pub use encoding::{hex_to_bytes, hex_to_hash};
pub use operations::{
    AddLiquidityArgs, RemoveLiquidityArgs, SwapArgs, SwapKind, TrustTarget, router_deadline,
};
pub use pool::PriceBand;
pub use results::decode_result_codes;
pub use soroban::apply_simulation;
