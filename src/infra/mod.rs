//! Infrastructure layer: HTTP adapters for the external services.

pub mod friendbot;
pub mod horizon;
pub mod http;
pub mod router_registry;
pub mod soroban_rpc;

pub use friendbot::{ACCOUNT_ALREADY_EXISTS, FriendbotFaucet};
pub use horizon::HorizonClient;
pub use router_registry::{HttpRouterDirectory, router_for};
pub use soroban_rpc::{HttpRpcTransport, RpcTransport, SorobanRpcClient};
