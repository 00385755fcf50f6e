//! Router discovery over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use super::http::{build_http_client, decode_json, ensure_success};
use crate::domain::{AppError, ConfigError, Network, RouterDirectory, RouterRecord};

/// Fetches `[{network, router_id, router_address}]` from a registry URL
pub struct HttpRouterDirectory {
    http_client: Client,
    url: String,
}

impl HttpRouterDirectory {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl RouterDirectory for HttpRouterDirectory {
    #[instrument(skip(self))]
    async fn routers(&self) -> Result<Vec<RouterRecord>, AppError> {
        let response = self.http_client.get(&self.url).send().await?;
        let records: Vec<RouterRecord> = decode_json(ensure_success(response).await?).await?;
        debug!(count = records.len(), "Fetched router records");
        Ok(records)
    }
}

/// Router address registered for `network`
pub async fn router_for<D: RouterDirectory + ?Sized>(
    directory: &D,
    network: Network,
) -> Result<String, AppError> {
    directory
        .routers()
        .await?
        .into_iter()
        .find(|record| record.network == network.as_str())
        .map(|record| record.router_address)
        .ok_or_else(|| AppError::Config(ConfigError::RouterNotFound(network.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticDirectory(Vec<RouterRecord>);

    #[async_trait]
    impl RouterDirectory for StaticDirectory {
        async fn routers(&self) -> Result<Vec<RouterRecord>, AppError> {
            Ok(self.0.clone())
        }
    }

    fn record(network: &str, address: &str) -> RouterRecord {
        RouterRecord {
            network: network.to_string(),
            router_id: "router".to_string(),
            router_address: address.to_string(),
        }
    }

    #[tokio::test]
    async fn test_router_for_selects_network() {
        let directory = StaticDirectory(vec![
            record("mainnet", "CMAIN"),
            record("testnet", "CTEST"),
            record("standalone", "CLOCAL"),
        ]);
        assert_eq!(router_for(&directory, Network::Testnet).await.unwrap(), "CTEST");
        assert_eq!(
            router_for(&directory, Network::Standalone).await.unwrap(),
            "CLOCAL"
        );
    }

    #[tokio::test]
    async fn test_router_for_missing_network_is_config_error() {
        let directory = StaticDirectory(vec![record("mainnet", "CMAIN")]);
        let err = router_for(&directory, Network::Testnet).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            AppError::Config(ConfigError::RouterNotFound(ref n)) if n == "testnet"
        ));
    }
}
