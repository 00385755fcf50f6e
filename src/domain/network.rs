//! Network name to passphrase resolution.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::ConfigError;

/// Passphrase of a local quickstart (standalone) network
pub const STANDALONE_PASSPHRASE: &str = "Standalone Network ; February 2017";

/// Passphrase of the public test network
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Supported ledger networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Standalone,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::Testnet => "testnet",
        }
    }

    /// Passphrase mixed into every transaction signature
    pub fn passphrase(&self) -> &'static str {
        match self {
            Self::Standalone => STANDALONE_PASSPHRASE,
            Self::Testnet => TESTNET_PASSPHRASE,
        }
    }

    /// SHA-256 of the passphrase, the network id used in signature payloads
    pub fn network_id(&self) -> [u8; 32] {
        Sha256::digest(self.passphrase().as_bytes()).into()
    }

    pub fn default_horizon_url(&self) -> &'static str {
        match self {
            Self::Standalone => "http://localhost:8000",
            Self::Testnet => "https://horizon-testnet.stellar.org",
        }
    }

    pub fn default_soroban_rpc_url(&self) -> &'static str {
        match self {
            Self::Standalone => "http://localhost:8000/soroban/rpc",
            Self::Testnet => "https://soroban-testnet.stellar.org",
        }
    }

    pub fn default_friendbot_url(&self) -> &'static str {
        match self {
            Self::Standalone => "http://localhost:8000/friendbot",
            Self::Testnet => "https://friendbot.stellar.org",
        }
    }
}

impl std::str::FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standalone" => Ok(Self::Standalone),
            "testnet" => Ok(Self::Testnet),
            other => Err(ConfigError::UnsupportedNetwork(other.to_string())),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolve a network name straight to its passphrase
pub fn network_passphrase(name: &str) -> Result<&'static str, ConfigError> {
    name.parse::<Network>().map(|n| n.passphrase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_networks_resolve_to_distinct_passphrases() {
        let standalone = network_passphrase("standalone").unwrap();
        let testnet = network_passphrase("testnet").unwrap();
        assert_eq!(standalone, "Standalone Network ; February 2017");
        assert_eq!(testnet, "Test SDF Network ; September 2015");
        assert_ne!(standalone, testnet);
        // Stable across calls
        assert_eq!(network_passphrase("testnet").unwrap(), testnet);
    }

    #[test]
    fn test_unknown_network_is_rejected() {
        for name in ["public", "mainnet", "", "Testnet", "futurenet"] {
            let err = network_passphrase(name).unwrap_err();
            assert_eq!(err, ConfigError::UnsupportedNetwork(name.to_string()));
        }
    }

    #[test]
    fn test_network_id_is_sha256_of_passphrase() {
        let id = Network::Testnet.network_id();
        assert_eq!(
            hex::encode(id),
            "cee0302d59844d32bdca915c8203dd44b33fbb7edc19051ea37abedf28ecd472"
        );
        assert_ne!(Network::Standalone.network_id(), id);
    }

    #[test]
    fn test_round_trip_display() {
        for n in [Network::Standalone, Network::Testnet] {
            assert_eq!(n.to_string().parse::<Network>().unwrap(), n);
        }
    }
}
