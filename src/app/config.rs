//! Client configuration.

use std::time::Duration;

use tracing::info;
use validator::Validate;

use super::poller::{DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_POLL_INTERVAL, PollPolicy};
use crate::domain::{AppError, ConfigError, Network, RouterDirectory};
use crate::infra::http::DEFAULT_HTTP_TIMEOUT;
use crate::infra::{HttpRouterDirectory, router_for};
use crate::tx::keys::decode_contract;

/// Immutable settings shared by every facade call
#[derive(Debug, Clone, Validate)]
pub struct ClientConfig {
    pub network: Network,
    #[validate(url(message = "Horizon URL must be a valid URL"))]
    pub horizon_url: String,
    #[validate(url(message = "Soroban RPC URL must be a valid URL"))]
    pub soroban_rpc_url: String,
    #[validate(url(message = "Friendbot URL must be a valid URL"))]
    pub friendbot_url: String,
    /// Soroswap router contract (`C...`), needed only for router calls
    pub router_address: Option<String>,
    pub poll: PollPolicy,
    pub http_timeout: Duration,
}

impl ClientConfig {
    /// Defaults for `network`: public endpoints, 1s polling, 60s bound
    #[must_use]
    pub fn new(network: Network) -> Self {
        Self {
            network,
            horizon_url: network.default_horizon_url().to_string(),
            soroban_rpc_url: network.default_soroban_rpc_url().to_string(),
            friendbot_url: network.default_friendbot_url().to_string(),
            router_address: None,
            poll: PollPolicy::default(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Defaults for a network given by name
    pub fn for_network_name(name: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(name.parse()?))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns the value of a variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let network: Network = get("STELLAR_NETWORK")
            .as_deref()
            .unwrap_or("testnet")
            .parse()?;
        let mut config = Self::new(network);

        if let Some(url) = get("HORIZON_URL") {
            config.horizon_url = url;
        }
        if let Some(url) = get("SOROBAN_RPC_URL") {
            config.soroban_rpc_url = url;
        }
        if let Some(url) = get("FRIENDBOT_URL") {
            config.friendbot_url = url;
        }
        if let Some(address) = get("SOROSWAP_ROUTER_ADDRESS") {
            config = config.with_router_address(address)?;
        }

        let interval_ms = parse_u64("POLL_INTERVAL_MS", get("POLL_INTERVAL_MS"))?
            .unwrap_or(DEFAULT_POLL_INTERVAL.as_millis() as u64);
        require_positive("POLL_INTERVAL_MS", interval_ms)?;
        // 0 opts into unbounded polling
        let timeout_secs = parse_u64("CONFIRMATION_TIMEOUT_SECS", get("CONFIRMATION_TIMEOUT_SECS"))?
            .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT.as_secs());
        config.poll = PollPolicy {
            interval: Duration::from_millis(interval_ms),
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        };

        if let Some(secs) = parse_u64("HTTP_TIMEOUT_SECS", get("HTTP_TIMEOUT_SECS"))? {
            require_positive("HTTP_TIMEOUT_SECS", secs)?;
            config.http_timeout = Duration::from_secs(secs);
        }

        config.check()?;
        Ok(config)
    }

    /// Set the router contract, rejecting anything that is not a `C...` address
    pub fn with_router_address(mut self, address: impl Into<String>) -> Result<Self, ConfigError> {
        let address = address.into();
        decode_contract(&address).map_err(|e| ConfigError::Invalid {
            name: "SOROSWAP_ROUTER_ADDRESS".to_string(),
            reason: e.to_string(),
        })?;
        self.router_address = Some(address);
        Ok(self)
    }

    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Validate URL fields and reject zero durations
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate().map_err(|e| ConfigError::Invalid {
            name: "url".to_string(),
            reason: e.to_string(),
        })?;
        require_positive("poll interval", self.poll.interval.as_millis())?;
        require_positive("HTTP timeout", self.http_timeout.as_millis())
    }

    /// Fill `router_address` from the router discovery endpoint at `registry_url`
    pub async fn resolve_router(self, registry_url: &str) -> Result<Self, AppError> {
        let directory = HttpRouterDirectory::new(registry_url, self.http_timeout)?;
        self.resolve_router_with(&directory).await
    }

    pub async fn resolve_router_with<D: RouterDirectory + ?Sized>(
        self,
        directory: &D,
    ) -> Result<Self, AppError> {
        let address = router_for(directory, self.network).await?;
        info!(network = %self.network, router = %address, "Resolved router address");
        Ok(self.with_router_address(address)?)
    }
}

fn parse_u64(name: &str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    value
        .map(|v| {
            v.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: name.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn require_positive(name: &str, value: impl Into<u128>) -> Result<(), ConfigError> {
    if value.into() == 0 {
        return Err(ConfigError::Invalid {
            name: name.to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RouterRecord;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use stellar_strkey::Contract;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_to_testnet() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.horizon_url, "https://horizon-testnet.stellar.org");
        assert_eq!(config.poll, PollPolicy::default());
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.router_address.is_none());
    }

    #[test]
    fn test_standalone_defaults_and_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("STELLAR_NETWORK", "standalone"),
            ("SOROBAN_RPC_URL", "http://rpc.local:8000/soroban/rpc"),
            ("POLL_INTERVAL_MS", "250"),
            ("CONFIRMATION_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.network, Network::Standalone);
        assert_eq!(config.horizon_url, "http://localhost:8000");
        assert_eq!(config.soroban_rpc_url, "http://rpc.local:8000/soroban/rpc");
        assert_eq!(
            config.poll,
            PollPolicy::bounded(Duration::from_millis(250), Duration::from_secs(5))
        );
    }

    #[test]
    fn test_zero_timeout_is_unbounded() {
        let config =
            ClientConfig::from_lookup(lookup(&[("CONFIRMATION_TIMEOUT_SECS", "0")])).unwrap();
        assert_eq!(config.poll.timeout, None);
    }

    #[test]
    fn test_unsupported_network_is_fatal() {
        let err = ClientConfig::from_lookup(lookup(&[("STELLAR_NETWORK", "futurenet")])).unwrap_err();
        assert_eq!(err, ConfigError::UnsupportedNetwork("futurenet".to_string()));
        assert!(AppError::from(err).is_fatal());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ClientConfig::from_lookup(lookup(&[("POLL_INTERVAL_MS", "fast")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("POLL_INTERVAL_MS", "0")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("HORIZON_URL", "not a url")])).is_err());
        assert!(
            ClientConfig::from_lookup(lookup(&[("SOROSWAP_ROUTER_ADDRESS", "GNOTACONTRACT")]))
                .is_err()
        );
    }

    #[test]
    fn test_zero_durations_rejected() {
        match ClientConfig::from_lookup(lookup(&[("HTTP_TIMEOUT_SECS", "0")])) {
            Err(ConfigError::Invalid { name, .. }) => assert_eq!(name, "HTTP_TIMEOUT_SECS"),
            other => panic!("expected invalid HTTP timeout, got {:?}", other),
        }

        let busy = ClientConfig::new(Network::Testnet)
            .with_poll_policy(PollPolicy::unbounded().with_interval(Duration::ZERO));
        assert!(busy.check().is_err());

        let mut no_timeout = ClientConfig::new(Network::Testnet);
        no_timeout.http_timeout = Duration::ZERO;
        assert!(no_timeout.check().is_err());
    }

    #[test]
    fn test_router_address_from_env() {
        let router = Contract([5u8; 32]).to_string();
        let config =
            ClientConfig::from_lookup(lookup(&[("SOROSWAP_ROUTER_ADDRESS", router.as_str())])).unwrap();
        assert_eq!(config.router_address, Some(router));
    }

    struct OneRouter(String);

    #[async_trait]
    impl RouterDirectory for OneRouter {
        async fn routers(&self) -> Result<Vec<RouterRecord>, AppError> {
            Ok(vec![RouterRecord {
                network: "testnet".to_string(),
                router_id: "soroswap".to_string(),
                router_address: self.0.clone(),
            }])
        }
    }

    #[tokio::test]
    async fn test_resolve_router_with_directory() {
        let router = Contract([6u8; 32]).to_string();
        let config = ClientConfig::new(Network::Testnet)
            .resolve_router_with(&OneRouter(router.clone()))
            .await
            .unwrap();
        assert_eq!(config.router_address, Some(router.clone()));

        let err = ClientConfig::new(Network::Standalone)
            .resolve_router_with(&OneRouter(router))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
