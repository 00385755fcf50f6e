//! Application layer: configuration, confirmation polling and the client facade.

pub mod client;
pub mod config;
pub mod poller;

pub use client::SoroswapClient;
pub use config::ClientConfig;
pub use poller::{ConfirmationPoller, PollPolicy};
