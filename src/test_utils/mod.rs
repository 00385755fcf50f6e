//! Test doubles for the external services.

pub mod mocks;

pub use mocks::{MOCK_RESOURCE_FEE, MOCK_TRANSACTION_DATA, MockConfig, MockLedger};
