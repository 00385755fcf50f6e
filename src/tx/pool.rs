//! Asset encoding, liquidity pool identifiers, and the deposit price band.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    AlphaNum4, AlphaNum12, Asset, AssetCode4, AssetCode12, ChangeTrustAsset,
    Hash, LiquidityPoolConstantProductParameters, LiquidityPoolParameters, Limits, PoolId, Price,
    WriteXdr,
};

use super::keys::account_id;
use crate::domain::{AssetRef, LiquidityPoolAsset, PoolFeeModel, ValidationError};

/// Fee of every constant product pool, in basis points
pub const LIQUIDITY_POOL_FEE_BPS: i32 = 30;

/// Accepted deviation from the reserve ratio when depositing (10%)
pub fn price_tolerance() -> Decimal {
    Decimal::new(1, 1)
}

/// Decimal places used for price band bounds
pub const PRICE_DECIMALS: u32 = 7;

pub fn asset_to_xdr(asset: &AssetRef) -> Result<Asset, ValidationError> {
    match asset {
        AssetRef::Native => Ok(Asset::Native),
        AssetRef::Credit { code, issuer } => {
            if code.is_empty() || code.len() > 12 || !code.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return Err(ValidationError::InvalidAsset(format!(
                    "asset code must be 1-12 alphanumeric characters, got {:?}",
                    code
                )));
            }
            let issuer = account_id(issuer)?;
            if code.len() <= 4 {
                let mut bytes = [0u8; 4];
                bytes[..code.len()].copy_from_slice(code.as_bytes());
                Ok(Asset::CreditAlphanum4(AlphaNum4 {
                    asset_code: AssetCode4(bytes),
                    issuer,
                }))
            } else {
                let mut bytes = [0u8; 12];
                bytes[..code.len()].copy_from_slice(code.as_bytes());
                Ok(Asset::CreditAlphanum12(AlphaNum12 {
                    asset_code: AssetCode12(bytes),
                    issuer,
                }))
            }
        }
    }
}

fn asset_rank(asset: &AssetRef) -> u8 {
    match asset {
        AssetRef::Native => 0,
        AssetRef::Credit { code, .. } if code.len() <= 4 => 1,
        AssetRef::Credit { .. } => 2,
    }
}

/// Canonical ledger ordering: native, then 4-char codes, then 12-char codes;
/// ties broken by code and then issuer.
pub fn compare_assets(a: &AssetRef, b: &AssetRef) -> Ordering {
    asset_rank(a).cmp(&asset_rank(b)).then_with(|| match (a, b) {
        (
            AssetRef::Credit {
                code: code_a,
                issuer: issuer_a,
            },
            AssetRef::Credit {
                code: code_b,
                issuer: issuer_b,
            },
        ) => code_a
            .as_bytes()
            .cmp(code_b.as_bytes())
            .then_with(|| issuer_a.cmp(issuer_b)),
        _ => Ordering::Equal,
    })
}

impl LiquidityPoolAsset {
    /// Build a pool from two assets in any order
    #[must_use]
    pub fn new(first: AssetRef, second: AssetRef) -> Self {
        let (asset_a, asset_b) = if compare_assets(&first, &second) == Ordering::Greater {
            (second, first)
        } else {
            (first, second)
        };
        Self {
            asset_a,
            asset_b,
            fee_model: PoolFeeModel::ConstantProduct,
        }
    }

    pub fn parameters(&self) -> Result<LiquidityPoolParameters, ValidationError> {
        if compare_assets(&self.asset_a, &self.asset_b) != Ordering::Less {
            return Err(ValidationError::InvalidAsset(format!(
                "pool assets must be distinct and ordered, got {} / {}",
                self.asset_a, self.asset_b
            )));
        }
        match self.fee_model {
            PoolFeeModel::ConstantProduct => Ok(LiquidityPoolParameters::LiquidityPoolConstantProduct(
                LiquidityPoolConstantProductParameters {
                    asset_a: asset_to_xdr(&self.asset_a)?,
                    asset_b: asset_to_xdr(&self.asset_b)?,
                    fee: LIQUIDITY_POOL_FEE_BPS,
                },
            )),
        }
    }

    /// SHA-256 of the XDR-encoded pool parameters
    pub fn pool_id(&self) -> Result<[u8; 32], ValidationError> {
        let params = self.parameters()?.to_xdr(Limits::none())?;
        Ok(Sha256::digest(params).into())
    }

    pub fn pool_id_hex(&self) -> Result<String, ValidationError> {
        Ok(hex::encode(self.pool_id()?))
    }

    pub fn xdr_pool_id(&self) -> Result<PoolId, ValidationError> {
        Ok(PoolId(Hash(self.pool_id()?)))
    }

    /// Trustline target for the pool share asset
    pub fn share_asset(&self) -> Result<ChangeTrustAsset, ValidationError> {
        Ok(ChangeTrustAsset::PoolShare(self.parameters()?))
    }
}

/// Acceptable execution prices for a pool deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBand {
    pub exact: Decimal,
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceBand {
    /// Band of +/-10% around `max_reserve_a / max_reserve_b`, bounds rounded to 7 places
    pub fn for_reserves(
        max_reserve_a: Decimal,
        max_reserve_b: Decimal,
    ) -> Result<Self, ValidationError> {
        if max_reserve_a <= Decimal::ZERO || max_reserve_b <= Decimal::ZERO {
            return Err(ValidationError::InvalidAmount(format!(
                "reserves must be positive, got {} and {}",
                max_reserve_a, max_reserve_b
            )));
        }
        let exact = max_reserve_a
            .checked_div(max_reserve_b)
            .ok_or_else(|| ValidationError::InvalidPrice("reserve ratio overflow".to_string()))?;
        let tolerance = price_tolerance();
        let scaled = |factor: Decimal| {
            exact
                .checked_mul(factor)
                .map(|v| v.round_dp(PRICE_DECIMALS))
                .ok_or_else(|| ValidationError::InvalidPrice("price band overflow".to_string()))
        };
        let mut min = scaled(Decimal::ONE - tolerance)?;
        let mut max = scaled(Decimal::ONE + tolerance)?;
        min.rescale(PRICE_DECIMALS);
        max.rescale(PRICE_DECIMALS);
        Ok(Self { exact, min, max })
    }

    pub fn min_price(&self) -> Result<Price, ValidationError> {
        approximate_price(self.min)
    }

    pub fn max_price(&self) -> Result<Price, ValidationError> {
        approximate_price(self.max)
    }
}

/// Best rational approximation `n/d` with both terms fitting in an i32,
/// found by walking the continued-fraction convergents of the exact decimal.
pub fn approximate_price(value: Decimal) -> Result<Price, ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::InvalidPrice(format!(
            "{} must be positive",
            value
        )));
    }
    let limit = i128::from(i32::MAX);
    let value = value.normalize();
    let (mut p, mut q) = (value.mantissa(), 10i128.pow(value.scale()));
    let (mut h_prev, mut h) = (0i128, 1i128);
    let (mut k_prev, mut k) = (1i128, 0i128);

    while q != 0 {
        let a = p / q;
        let next = a
            .checked_mul(h)
            .and_then(|x| x.checked_add(h_prev))
            .zip(a.checked_mul(k).and_then(|x| x.checked_add(k_prev)));
        let Some((h_next, k_next)) = next else {
            break;
        };
        if h_next > limit || k_next > limit {
            break;
        }
        (h_prev, h) = (h, h_next);
        (k_prev, k) = (k, k_next);
        (p, q) = (q, p - a * q);
    }

    match (i32::try_from(h), i32::try_from(k)) {
        (Ok(n), Ok(d)) if n > 0 && d > 0 => Ok(Price { n, d }),
        _ => Err(ValidationError::InvalidPrice(format!(
            "no i32 approximation for {}",
            value
        ))),
    }
}
