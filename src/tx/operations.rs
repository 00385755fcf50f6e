//! Operation factories.
//!
//! Every function here is pure: typed arguments in, one ledger operation out.

use chrono::{DateTime, Utc};
use stellar_xdr::curr::{
    AlphaNum4, AlphaNum12, Asset, ChangeTrustAsset, ChangeTrustOp, HostFunction,
    InvokeContractArgs, InvokeHostFunctionOp, Int128Parts, LiquidityPoolDepositOp,
    LiquidityPoolWithdrawOp, Operation, OperationBody, PaymentOp, ScAddress, ScSymbol, ScVal,
    ScVec, VecM,
};

use super::keys::{muxed_account, sc_address};
use super::pool::{PriceBand, asset_to_xdr};
use crate::domain::{AssetRef, LiquidityPoolAsset, ValidationError};

/// How far ahead router calls are allowed to execute, in seconds
pub const DEADLINE_HORIZON_SECS: i64 = 3600;

/// Trustline limit used when none is given
pub const MAX_TRUST_LIMIT: i64 = i64::MAX;

/// Router deadline for a call made at `now`.
///
/// The router compares this against the ledger close time, which is in
/// unix seconds.
pub fn router_deadline(now: DateTime<Utc>) -> u64 {
    u64::try_from(now.timestamp() + DEADLINE_HORIZON_SECS).unwrap_or(0)
}

fn operation(body: OperationBody) -> Operation {
    Operation {
        source_account: None,
        body,
    }
}

pub fn i128_to_scval(amount: i128) -> ScVal {
    let hi = (amount >> 64) as i64;
    let lo = amount as u64;
    ScVal::I128(Int128Parts { hi, lo })
}

pub fn address_to_scval(address: &str) -> Result<ScVal, ValidationError> {
    Ok(ScVal::Address(sc_address(address)?))
}

fn path_to_scval(path: &[String]) -> Result<ScVal, ValidationError> {
    if path.len() < 2 {
        return Err(ValidationError::InvalidAsset(format!(
            "swap path needs at least two tokens, got {}",
            path.len()
        )));
    }
    let addresses = path
        .iter()
        .map(|token| address_to_scval(token))
        .collect::<Result<Vec<_>, _>>()?;
    let vec: ScVec = addresses.try_into()?;
    Ok(ScVal::Vec(Some(vec)))
}

pub fn payment(destination: &str, asset: &AssetRef, amount: i64) -> Result<Operation, ValidationError> {
    Ok(operation(OperationBody::Payment(PaymentOp {
        destination: muxed_account(destination)?,
        asset: asset_to_xdr(asset)?,
        amount,
    })))
}

/// Target of a change-trust operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustTarget {
    Asset(AssetRef),
    PoolShare(LiquidityPoolAsset),
}

pub fn change_trust(target: &TrustTarget, limit: i64) -> Result<Operation, ValidationError> {
    let line = match target {
        TrustTarget::Asset(asset) => match asset_to_xdr(asset)? {
            Asset::Native => {
                return Err(ValidationError::InvalidAsset(
                    "the native asset needs no trustline".to_string(),
                ));
            }
            Asset::CreditAlphanum4(AlphaNum4 { asset_code, issuer }) => {
                ChangeTrustAsset::CreditAlphanum4(AlphaNum4 { asset_code, issuer })
            }
            Asset::CreditAlphanum12(AlphaNum12 { asset_code, issuer }) => {
                ChangeTrustAsset::CreditAlphanum12(AlphaNum12 { asset_code, issuer })
            }
        },
        TrustTarget::PoolShare(pool) => pool.share_asset()?,
    };
    Ok(operation(OperationBody::ChangeTrust(ChangeTrustOp { line, limit })))
}

/// Deposit into a constant product pool.
///
/// The accepted price range is the reserve ratio `max_amount_a / max_amount_b`
/// widened by 10% in each direction.
pub fn liquidity_pool_deposit(
    pool: &LiquidityPoolAsset,
    max_amount_a: i64,
    max_amount_b: i64,
) -> Result<Operation, ValidationError> {
    let band = PriceBand::for_reserves(max_amount_a.into(), max_amount_b.into())?;
    Ok(operation(OperationBody::LiquidityPoolDeposit(
        LiquidityPoolDepositOp {
            liquidity_pool_id: pool.xdr_pool_id()?,
            max_amount_a,
            max_amount_b,
            min_price: band.min_price()?,
            max_price: band.max_price()?,
        },
    )))
}

/// Withdraw pool shares. The pool id is derived from the asset pair.
pub fn liquidity_pool_withdraw(
    pool: &LiquidityPoolAsset,
    shares: i64,
    min_amount_a: i64,
    min_amount_b: i64,
) -> Result<Operation, ValidationError> {
    if shares <= 0 {
        return Err(ValidationError::InvalidAmount(format!(
            "withdrawn shares must be positive, got {}",
            shares
        )));
    }
    Ok(operation(OperationBody::LiquidityPoolWithdraw(
        LiquidityPoolWithdrawOp {
            liquidity_pool_id: pool.xdr_pool_id()?,
            amount: shares,
            min_amount_a,
            min_amount_b,
        },
    )))
}

pub fn invoke_contract(
    contract: &str,
    function: &str,
    args: Vec<ScVal>,
) -> Result<Operation, ValidationError> {
    let contract_address = match sc_address(contract)? {
        address @ ScAddress::Contract(_) => address,
        _ => return Err(ValidationError::InvalidAddress(contract.to_string())),
    };
    let function_name = ScSymbol::try_from(function)
        .map_err(|_| ValidationError::Xdr(format!("invalid function name {:?}", function)))?;
    let args: VecM<ScVal> = args.try_into()?;
    Ok(operation(OperationBody::InvokeHostFunction(
        InvokeHostFunctionOp {
            host_function: HostFunction::InvokeContract(InvokeContractArgs {
                contract_address,
                function_name,
                args,
            }),
            auth: VecM::default(),
        },
    )))
}

/// `mint(to, amount)` on a token contract
pub fn token_mint(token: &str, to: &str, amount: i128) -> Result<Operation, ValidationError> {
    invoke_contract(token, "mint", vec![address_to_scval(to)?, i128_to_scval(amount)])
}

/// Arguments of the router's `add_liquidity`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityArgs {
    pub token_a: String,
    pub token_b: String,
    pub amount_a_desired: i128,
    pub amount_b_desired: i128,
    pub amount_a_min: i128,
    pub amount_b_min: i128,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidityArgs {
    pub token_a: String,
    pub token_b: String,
    pub liquidity: i128,
    pub amount_a_min: i128,
    pub amount_b_min: i128,
    pub to: String,
}

/// Which side of a swap is fixed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapKind {
    /// Spend exactly `amount`, receive at least `limit`
    ExactIn,
    /// Receive exactly `amount`, spend at most `limit`
    ExactOut,
}

impl SwapKind {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::ExactIn => "swap_exact_tokens_for_tokens",
            Self::ExactOut => "swap_tokens_for_exact_tokens",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapArgs {
    pub kind: SwapKind,
    pub amount: i128,
    pub limit: i128,
    /// Token contract addresses from input to output
    pub path: Vec<String>,
    pub to: String,
}

pub fn add_liquidity(
    router: &str,
    args: &AddLiquidityArgs,
    deadline: u64,
) -> Result<Operation, ValidationError> {
    invoke_contract(
        router,
        "add_liquidity",
        vec![
            address_to_scval(&args.token_a)?,
            address_to_scval(&args.token_b)?,
            i128_to_scval(args.amount_a_desired),
            i128_to_scval(args.amount_b_desired),
            i128_to_scval(args.amount_a_min),
            i128_to_scval(args.amount_b_min),
            address_to_scval(&args.to)?,
            ScVal::U64(deadline),
        ],
    )
}

pub fn remove_liquidity(
    router: &str,
    args: &RemoveLiquidityArgs,
    deadline: u64,
) -> Result<Operation, ValidationError> {
    invoke_contract(
        router,
        "remove_liquidity",
        vec![
            address_to_scval(&args.token_a)?,
            address_to_scval(&args.token_b)?,
            i128_to_scval(args.liquidity),
            i128_to_scval(args.amount_a_min),
            i128_to_scval(args.amount_b_min),
            address_to_scval(&args.to)?,
            ScVal::U64(deadline),
        ],
    )
}

pub fn swap(router: &str, args: &SwapArgs, deadline: u64) -> Result<Operation, ValidationError> {
    invoke_contract(
        router,
        args.kind.function_name(),
        vec![
            i128_to_scval(args.amount),
            i128_to_scval(args.limit),
            path_to_scval(&args.path)?,
            address_to_scval(&args.to)?,
            ScVal::U64(deadline),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TestAccount;
    use chrono::TimeZone;
    use stellar_strkey::Contract;
    use stellar_xdr::curr::Price;

    fn contract(byte: u8) -> String {
        Contract([byte; 32]).to_string()
    }

    fn invoke_args(op: &Operation) -> &InvokeContractArgs {
        match &op.body {
            OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                host_function: HostFunction::InvokeContract(args),
                ..
            }) => args,
            other => panic!("expected contract invocation, got {:?}", other),
        }
    }

    #[test]
    fn test_router_deadline_is_one_hour_in_seconds() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let deadline = router_deadline(now);
        assert_eq!(deadline, 1_704_067_200 + 3_600);

        // Ten hours (36_000_000 ms read as 36_000 s) must not come back
        assert_ne!(deadline, 1_704_067_200 + 36_000);
    }

    #[test]
    fn test_i128_to_scval_splits_words() {
        assert_eq!(i128_to_scval(5), ScVal::I128(Int128Parts { hi: 0, lo: 5 }));
        assert_eq!(
            i128_to_scval(-1),
            ScVal::I128(Int128Parts {
                hi: -1,
                lo: u64::MAX
            })
        );
        assert_eq!(
            i128_to_scval(1i128 << 64),
            ScVal::I128(Int128Parts { hi: 1, lo: 0 })
        );
    }

    #[test]
    fn test_payment_carries_amount_and_destination() {
        let dest = TestAccount::random().public_key;
        let op = payment(&dest, &AssetRef::Native, 10_000_000).unwrap();
        match op.body {
            OperationBody::Payment(p) => {
                assert_eq!(p.amount, 10_000_000);
                assert_eq!(p.asset, Asset::Native);
                assert_eq!(p.destination, muxed_account(&dest).unwrap());
            }
            other => panic!("expected payment, got {:?}", other),
        }
        assert!(payment("nope", &AssetRef::Native, 1).is_err());
    }

    #[test]
    fn test_change_trust_rejects_native() {
        let err = change_trust(&TrustTarget::Asset(AssetRef::Native), MAX_TRUST_LIMIT);
        assert!(matches!(err, Err(ValidationError::InvalidAsset(_))));
    }

    #[test]
    fn test_change_trust_pool_share() {
        let issuer = TestAccount::random().public_key;
        let pool = LiquidityPoolAsset::new(AssetRef::Native, AssetRef::credit("USD", &issuer));
        let op = change_trust(&TrustTarget::PoolShare(pool), MAX_TRUST_LIMIT).unwrap();
        match op.body {
            OperationBody::ChangeTrust(ct) => {
                assert!(matches!(ct.line, ChangeTrustAsset::PoolShare(_)));
                assert_eq!(ct.limit, i64::MAX);
            }
            other => panic!("expected change trust, got {:?}", other),
        }
    }

    #[test]
    fn test_deposit_uses_ten_percent_band() {
        let issuer = TestAccount::random().public_key;
        let pool = LiquidityPoolAsset::new(AssetRef::Native, AssetRef::credit("USD", &issuer));
        let op = liquidity_pool_deposit(&pool, 200, 100).unwrap();
        match op.body {
            OperationBody::LiquidityPoolDeposit(d) => {
                assert_eq!(d.liquidity_pool_id, pool.xdr_pool_id().unwrap());
                assert_eq!(d.min_price, Price { n: 9, d: 5 });
                assert_eq!(d.max_price, Price { n: 11, d: 5 });
            }
            other => panic!("expected deposit, got {:?}", other),
        }
    }

    #[test]
    fn test_withdraw_derives_pool_id() {
        let issuer = TestAccount::random().public_key;
        let pool = LiquidityPoolAsset::new(AssetRef::credit("EUR", &issuer), AssetRef::Native);
        let op = liquidity_pool_withdraw(&pool, 50, 1, 1).unwrap();
        match op.body {
            OperationBody::LiquidityPoolWithdraw(w) => {
                assert_eq!(w.liquidity_pool_id, pool.xdr_pool_id().unwrap());
                assert_eq!(w.amount, 50);
            }
            other => panic!("expected withdraw, got {:?}", other),
        }
        assert!(liquidity_pool_withdraw(&pool, 0, 0, 0).is_err());
    }

    #[test]
    fn test_token_mint_shape() {
        let to = TestAccount::random().public_key;
        let op = token_mint(&contract(3), &to, 1_000).unwrap();
        let args = invoke_args(&op);
        assert_eq!(args.function_name, ScSymbol::try_from("mint").unwrap());
        assert_eq!(args.args.len(), 2);
        assert_eq!(args.args[0], address_to_scval(&to).unwrap());
        assert_eq!(args.args[1], i128_to_scval(1_000));
    }

    #[test]
    fn test_invoke_requires_contract_address() {
        let account = TestAccount::random().public_key;
        assert!(matches!(
            invoke_contract(&account, "mint", vec![]),
            Err(ValidationError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_invoke_rejects_overlong_function_name() {
        let name = "a".repeat(33);
        match invoke_contract(&contract(3), &name, vec![]) {
            Err(ValidationError::Xdr(msg)) => assert!(msg.contains("invalid function name")),
            other => panic!("expected xdr error, got {:?}", other),
        }
        assert!(invoke_contract(&contract(3), &"a".repeat(32), vec![]).is_ok());
    }

    #[test]
    fn test_add_liquidity_argument_order() {
        let to = TestAccount::random().public_key;
        let args = AddLiquidityArgs {
            token_a: contract(1),
            token_b: contract(2),
            amount_a_desired: 100,
            amount_b_desired: 200,
            amount_a_min: 90,
            amount_b_min: 180,
            to: to.clone(),
        };
        let op = add_liquidity(&contract(9), &args, 42).unwrap();
        let invoked = invoke_args(&op);
        assert_eq!(
            invoked.function_name,
            ScSymbol::try_from("add_liquidity").unwrap()
        );
        assert_eq!(invoked.args.len(), 8);
        assert_eq!(invoked.args[2], i128_to_scval(100));
        assert_eq!(invoked.args[5], i128_to_scval(180));
        assert_eq!(invoked.args[6], address_to_scval(&to).unwrap());
        assert_eq!(invoked.args[7], ScVal::U64(42));
    }

    #[test]
    fn test_remove_liquidity_argument_order() {
        let to = TestAccount::random().public_key;
        let args = RemoveLiquidityArgs {
            token_a: contract(1),
            token_b: contract(2),
            liquidity: 70,
            amount_a_min: 1,
            amount_b_min: 2,
            to,
        };
        let op = remove_liquidity(&contract(9), &args, 7).unwrap();
        let invoked = invoke_args(&op);
        assert_eq!(invoked.args.len(), 7);
        assert_eq!(invoked.args[2], i128_to_scval(70));
        assert_eq!(invoked.args[6], ScVal::U64(7));
    }

    #[test]
    fn test_swap_selects_function_by_kind() {
        let to = TestAccount::random().public_key;
        let mut args = SwapArgs {
            kind: SwapKind::ExactIn,
            amount: 10,
            limit: 9,
            path: vec![contract(1), contract(2)],
            to,
        };
        let op = swap(&contract(9), &args, 1).unwrap();
        assert_eq!(
            invoke_args(&op).function_name,
            ScSymbol::try_from("swap_exact_tokens_for_tokens").unwrap()
        );
        match &invoke_args(&op).args[2] {
            ScVal::Vec(Some(path)) => assert_eq!(path.len(), 2),
            other => panic!("expected path vector, got {:?}", other),
        }

        args.kind = SwapKind::ExactOut;
        let op = swap(&contract(9), &args, 1).unwrap();
        assert_eq!(
            invoke_args(&op).function_name,
            ScSymbol::try_from("swap_tokens_for_exact_tokens").unwrap()
        );

        args.path.truncate(1);
        assert!(swap(&contract(9), &args, 1).is_err());
    }
}
