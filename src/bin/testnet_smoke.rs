//! Smoke run against a live network.
//!
//! Funds two fresh accounts through Friendbot, sends a native payment
//! between them and prints the outcomes. Configuration comes from the
//! environment (see `ClientConfig::from_env`); `ROUTER_REGISTRY_URL`, when
//! set, resolves the Soroswap router before the run.
//!
//! Usage:
//!   cargo run --bin testnet_smoke

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use soroswap_stellar_client::{AssetRef, ClientConfig, SoroswapClient, TestAccount};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,soroswap_stellar_client=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let mut config = ClientConfig::from_env().context("Invalid client configuration")?;
    if let Ok(registry_url) = std::env::var("ROUTER_REGISTRY_URL") {
        config = config
            .resolve_router(&registry_url)
            .await
            .context("Failed to resolve router address")?;
    }
    info!(
        network = %config.network,
        router = ?config.router_address,
        "Starting smoke run v{}",
        env!("CARGO_PKG_VERSION")
    );

    let client = Arc::new(SoroswapClient::new(config).context("Failed to build client")?);

    let interrupt = client.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling pending confirmations");
            interrupt.cancel_all();
        }
    });

    let alice = TestAccount::random();
    let bob = TestAccount::random();
    info!(alice = %alice.public_key, bob = %bob.public_key, "Generated accounts");

    for account in [&alice, &bob] {
        let outcome = client.fund_account(&account.public_key).await;
        info!(account = %account.public_key, outcome = ?outcome, "Funding");
        if !outcome.is_success() {
            bail!("Funding {} failed: {:?}", account.public_key, outcome);
        }
    }

    let outcome = client
        .payment(&alice, &bob.public_key, &AssetRef::Native, "10")
        .await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if !outcome.is_success() {
        bail!("Payment did not succeed");
    }

    let balances = client.balances(&bob.public_key).await?;
    for balance in balances {
        info!(asset_type = %balance.asset_type, balance = %balance.balance, "Bob balance");
    }
    Ok(())
}
