//! Client facade: one async method per supported action.
//!
//! Every action returns a [`TxOutcome`]. Transport and validation failures
//! become `TxOutcome::Error` instead of propagating.
//!
//! [`SoroswapClient::cancel_all`] stops the actions in flight when it is
//! called. An action cancelled before submission sends nothing; one cancelled
//! while awaiting confirmation reports the submitted hash. Actions started
//! afterwards run normally.
//!
//! Calls that share a source account race for its sequence number. The
//! client does not serialize them; callers that need ordering must await
//! one action before starting the next.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use stellar_xdr::curr::Operation;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::config::ClientConfig;
use super::poller::ConfirmationPoller;
use crate::domain::{
    AppError, AssetRef, Balance, ConfigError, Confirmation, Faucet, FundingOutcome, InvokeAndTrack,
    LiquidityPoolAsset, SubmitAndTrack, TestAccount, TxOutcome,
};
use crate::infra::{FriendbotFaucet, HorizonClient, SorobanRpcClient};
use crate::tx::amount::{to_positive_stroops, to_stroops};
use crate::tx::builder::{TransactionBuilder, unsigned_envelope_base64};
use crate::tx::operations::{
    self, AddLiquidityArgs, MAX_TRUST_LIMIT, RemoveLiquidityArgs, SwapArgs, TrustTarget,
    router_deadline,
};
use crate::tx::soroban::apply_simulation;

pub struct SoroswapClient {
    config: ClientConfig,
    builder: TransactionBuilder,
    horizon: Arc<dyn SubmitAndTrack>,
    soroban: Arc<dyn InvokeAndTrack>,
    faucet: Arc<dyn Faucet>,
    poller: ConfirmationPoller,
    /// Token shared by the actions started since the last `cancel_all`
    cancel: Mutex<CancellationToken>,
}

impl SoroswapClient {
    /// Build a client talking to the endpoints in `config`.
    ///
    /// Configuration problems surface here and nowhere else.
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        config.check()?;
        let horizon = HorizonClient::new(&config.horizon_url, config.http_timeout)?;
        let soroban = SorobanRpcClient::new(&config.soroban_rpc_url, config.http_timeout)?;
        let faucet = FriendbotFaucet::new(&config.friendbot_url, config.http_timeout)?;
        info!(
            network = %config.network,
            horizon = %config.horizon_url,
            soroban_rpc = %config.soroban_rpc_url,
            "Created Soroswap client"
        );
        Ok(Self::with_services(
            config,
            Arc::new(horizon),
            Arc::new(soroban),
            Arc::new(faucet),
        ))
    }

    /// Build a client over explicit service implementations (useful for testing)
    pub fn with_services(
        config: ClientConfig,
        horizon: Arc<dyn SubmitAndTrack>,
        soroban: Arc<dyn InvokeAndTrack>,
        faucet: Arc<dyn Faucet>,
    ) -> Self {
        Self {
            builder: TransactionBuilder::new(config.network),
            poller: ConfirmationPoller::new(config.poll),
            config,
            horizon,
            soroban,
            faucet,
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Token observed by the actions in flight. It fires on the next `cancel_all`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stop every action in flight. They resolve to `TxOutcome::Error`.
    /// Later actions get a fresh token and are unaffected.
    pub fn cancel_all(&self) {
        warn!("Cancelling all in-flight actions");
        let mut current = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = CancellationToken::new();
    }

    /// Ask the faucet to fund `public_key`. An account that already exists
    /// counts as funded.
    #[instrument(skip(self))]
    pub async fn fund_account(&self, public_key: &str) -> FundingOutcome {
        match self.faucet.fund(public_key).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(public_key = %public_key, error = %e, "Faucet request failed");
                FundingOutcome::Error {
                    error: e.to_string(),
                }
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn balances(&self, public_key: &str) -> Result<Vec<Balance>, AppError> {
        Ok(self.horizon.load_account(public_key).await?.balances)
    }

    /// Transfer `amount` (decimal units, up to 7 places) of `asset`
    #[instrument(skip(self, source), fields(source = %source.public_key))]
    pub async fn payment(
        &self,
        source: &TestAccount,
        destination: &str,
        asset: &AssetRef,
        amount: &str,
    ) -> TxOutcome {
        let op = to_positive_stroops(amount)
            .and_then(|amount| operations::payment(destination, asset, amount))
            .map_err(AppError::from);
        self.run_classic("payment", source, op).await
    }

    /// Establish a trustline to a classic asset
    #[instrument(skip(self, account), fields(account = %account.public_key))]
    pub async fn trust_asset(&self, account: &TestAccount, asset: &AssetRef) -> TxOutcome {
        let op = operations::change_trust(&TrustTarget::Asset(asset.clone()), MAX_TRUST_LIMIT)
            .map_err(AppError::from);
        self.run_classic("trust_asset", account, op).await
    }

    /// Establish a trustline to a pool's share asset, required before depositing
    #[instrument(skip(self, account, pool), fields(account = %account.public_key))]
    pub async fn trust_pool(&self, account: &TestAccount, pool: &LiquidityPoolAsset) -> TxOutcome {
        let op = operations::change_trust(&TrustTarget::PoolShare(pool.clone()), MAX_TRUST_LIMIT)
            .map_err(AppError::from);
        self.run_classic("trust_pool", account, op).await
    }

    /// Deposit up to the given reserves, accepting prices within 10% of their ratio
    #[instrument(skip(self, source, pool), fields(source = %source.public_key))]
    pub async fn deposit_liquidity_pool(
        &self,
        source: &TestAccount,
        pool: &LiquidityPoolAsset,
        max_reserve_a: &str,
        max_reserve_b: &str,
    ) -> TxOutcome {
        let op = to_positive_stroops(max_reserve_a)
            .and_then(|a| Ok((a, to_positive_stroops(max_reserve_b)?)))
            .and_then(|(a, b)| operations::liquidity_pool_deposit(pool, a, b))
            .map_err(AppError::from);
        self.run_classic("deposit_liquidity_pool", source, op).await
    }

    #[instrument(skip(self, source, pool), fields(source = %source.public_key))]
    pub async fn withdraw_liquidity_pool(
        &self,
        source: &TestAccount,
        pool: &LiquidityPoolAsset,
        shares: &str,
        min_amount_a: &str,
        min_amount_b: &str,
    ) -> TxOutcome {
        let op = (|| {
            operations::liquidity_pool_withdraw(
                pool,
                to_positive_stroops(shares)?,
                to_stroops(min_amount_a)?,
                to_stroops(min_amount_b)?,
            )
        })()
        .map_err(AppError::from);
        self.run_classic("withdraw_liquidity_pool", source, op).await
    }

    /// Mint `amount` (raw token units) of `token` to `to`, signed by the token admin
    #[instrument(skip(self, admin), fields(admin = %admin.public_key))]
    pub async fn mint_token(
        &self,
        admin: &TestAccount,
        token: &str,
        to: &str,
        amount: i128,
    ) -> TxOutcome {
        let op = operations::token_mint(token, to, amount).map_err(AppError::from);
        self.run_invocation("mint", admin, op).await
    }

    #[instrument(skip(self, source, args), fields(source = %source.public_key))]
    pub async fn add_liquidity(&self, source: &TestAccount, args: &AddLiquidityArgs) -> TxOutcome {
        let op = self.router().and_then(|router| {
            Ok(operations::add_liquidity(
                router,
                args,
                router_deadline(Utc::now()),
            )?)
        });
        self.run_invocation("add_liquidity", source, op).await
    }

    #[instrument(skip(self, source, args), fields(source = %source.public_key))]
    pub async fn remove_liquidity(
        &self,
        source: &TestAccount,
        args: &RemoveLiquidityArgs,
    ) -> TxOutcome {
        let op = self.router().and_then(|router| {
            Ok(operations::remove_liquidity(
                router,
                args,
                router_deadline(Utc::now()),
            )?)
        });
        self.run_invocation("remove_liquidity", source, op).await
    }

    #[instrument(skip(self, source, args), fields(source = %source.public_key, kind = ?args.kind))]
    pub async fn swap(&self, source: &TestAccount, args: &SwapArgs) -> TxOutcome {
        let op = self
            .router()
            .and_then(|router| Ok(operations::swap(router, args, router_deadline(Utc::now()))?));
        self.run_invocation("swap", source, op).await
    }

    fn router(&self) -> Result<&str, AppError> {
        self.config.router_address.as_deref().ok_or_else(|| {
            AppError::Config(ConfigError::Missing(
                "SOROSWAP_ROUTER_ADDRESS".to_string(),
            ))
        })
    }

    async fn run_classic(
        &self,
        action: &str,
        source: &TestAccount,
        op: Result<Operation, AppError>,
    ) -> TxOutcome {
        let cancel = self.cancellation_token();
        let result = match op {
            Ok(op) => self.submit_classic(source, vec![op], &cancel).await,
            Err(e) => Err(e),
        };
        finish(action, result)
    }

    async fn run_invocation(
        &self,
        action: &str,
        source: &TestAccount,
        op: Result<Operation, AppError>,
    ) -> TxOutcome {
        let cancel = self.cancellation_token();
        let result = match op {
            Ok(op) => self.submit_invocation(source, op, &cancel).await,
            Err(e) => Err(e),
        };
        finish(action, result)
    }

    /// Load, build, sign, submit to Horizon, and wait
    async fn submit_classic(
        &self,
        source: &TestAccount,
        operations: Vec<Operation>,
        cancel: &CancellationToken,
    ) -> Result<Confirmation, AppError> {
        let signing_key = source.signing_key()?;
        ensure_active(cancel)?;
        let account = self.horizon.load_account(&source.public_key).await?;
        let signed = self.builder.build(&account, &signing_key, operations)?;
        ensure_active(cancel)?;
        let hash = self.horizon.submit(&signed.to_base64()?).await?;
        self.poller
            .await_confirmation(self.horizon.as_ref(), &hash, cancel)
            .await
    }

    /// Load, build, simulate, apply resources, sign, send over RPC, and wait
    async fn submit_invocation(
        &self,
        source: &TestAccount,
        operation: Operation,
        cancel: &CancellationToken,
    ) -> Result<Confirmation, AppError> {
        let signing_key = source.signing_key()?;
        ensure_active(cancel)?;
        let account = self.soroban.load_account(&source.public_key).await?;
        let tx = self.builder.assemble(&account, vec![operation], Utc::now())?;
        let simulation = self.soroban.simulate(&unsigned_envelope_base64(&tx)?).await?;
        let prepared = apply_simulation(tx, &simulation)?;
        let signed = self.builder.sign(prepared, &signing_key)?;
        ensure_active(cancel)?;
        let hash = self.soroban.send(&signed.to_base64()?).await?;
        if hash != signed.hash_hex() {
            debug!(returned = %hash, local = %signed.hash_hex(), "RPC returned a different hash");
        }
        self.poller
            .await_confirmation(self.soroban.as_ref(), &hash, cancel)
            .await
    }
}

fn ensure_active(cancel: &CancellationToken) -> Result<(), AppError> {
    if cancel.is_cancelled() {
        return Err(AppError::CancelledBeforeSubmission);
    }
    Ok(())
}

fn finish(action: &str, result: Result<Confirmation, AppError>) -> TxOutcome {
    match &result {
        Ok(Confirmation::Success(record)) => {
            info!(action, hash = %record.hash, "Action succeeded")
        }
        Ok(Confirmation::Failed(record)) => {
            warn!(action, hash = %record.hash, "Action failed on ledger")
        }
        Err(e) => warn!(action, error = %e, hash = ?e.submitted_hash(), "Action did not complete"),
    }
    result.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Network;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = ClientConfig::new(Network::Testnet);
        config.horizon_url = "nope".to_string();
        let err = SoroswapClient::new(config).err().unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_new_with_defaults() {
        let client = SoroswapClient::new(ClientConfig::new(Network::Standalone)).unwrap();
        assert_eq!(client.config().network, Network::Standalone);
        let in_flight = client.cancellation_token();
        assert!(!in_flight.is_cancelled());
        client.cancel_all();
        assert!(in_flight.is_cancelled());
        assert!(!client.cancellation_token().is_cancelled());
    }
}
