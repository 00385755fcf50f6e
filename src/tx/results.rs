//! Ledger result decoding.
//!
//! Both services return the outcome of a transaction as base64
//! `TransactionResult` XDR. These helpers turn it into the `tx_*` / `op_*`
//! codes Horizon reports, e.g. `tx_failed [op_underfunded]`.

use stellar_xdr::curr::{
    InnerTransactionResultResult, OperationResult, OperationResultTr, TransactionResult,
    TransactionResultResult,
};
use tracing::debug;

use super::encoding::from_base64_xdr;
use crate::domain::{ResultCodes, TxRecord, ValidationError};

/// Decode base64 `TransactionResult` XDR into result codes
pub fn decode_result_codes(result_xdr: &str) -> Result<ResultCodes, ValidationError> {
    let result: TransactionResult = from_base64_xdr(result_xdr)?;
    let operations = match &result.result {
        TransactionResultResult::TxSuccess(ops) | TransactionResultResult::TxFailed(ops) => {
            ops.iter().map(operation_code).collect()
        }
        TransactionResultResult::TxFeeBumpInnerSuccess(pair)
        | TransactionResultResult::TxFeeBumpInnerFailed(pair) => match &pair.result.result {
            InnerTransactionResultResult::TxSuccess(ops)
            | InnerTransactionResultResult::TxFailed(ops) => {
                ops.iter().map(operation_code).collect()
            }
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    Ok(ResultCodes {
        transaction: snake_case(result.result.name()),
        operations,
    })
}

/// Terminal record for `hash`, with codes filled in when `result_xdr` decodes
pub fn ledger_record(hash: &str, ledger: Option<u32>, result_xdr: Option<String>) -> TxRecord {
    let result_codes = result_xdr
        .as_deref()
        .and_then(|xdr| match decode_result_codes(xdr) {
            Ok(codes) => Some(codes),
            Err(e) => {
                debug!(hash = %hash, error = %e, "Undecodable result XDR");
                None
            }
        });
    TxRecord {
        hash: hash.to_string(),
        ledger,
        result_xdr,
        result_codes,
    }
}

/// Human-readable detail for a rejected submission. Falls back to the raw
/// XDR when it does not decode.
pub fn rejection_detail(error_result_xdr: Option<String>) -> String {
    match error_result_xdr {
        Some(xdr) => decode_result_codes(&xdr)
            .map(|codes| codes.to_string())
            .unwrap_or(xdr),
        None => "no result".to_string(),
    }
}

fn operation_code(result: &OperationResult) -> String {
    let OperationResult::OpInner(inner) = result else {
        return snake_case(result.name());
    };
    let name = match inner {
        OperationResultTr::CreateAccount(r) => r.name(),
        OperationResultTr::Payment(r) => r.name(),
        OperationResultTr::PathPaymentStrictReceive(r) => r.name(),
        OperationResultTr::ManageSellOffer(r) => r.name(),
        OperationResultTr::CreatePassiveSellOffer(r) => r.name(),
        OperationResultTr::SetOptions(r) => r.name(),
        OperationResultTr::ChangeTrust(r) => r.name(),
        OperationResultTr::AllowTrust(r) => r.name(),
        OperationResultTr::AccountMerge(r) => r.name(),
        OperationResultTr::Inflation(r) => r.name(),
        OperationResultTr::ManageData(r) => r.name(),
        OperationResultTr::BumpSequence(r) => r.name(),
        OperationResultTr::ManageBuyOffer(r) => r.name(),
        OperationResultTr::PathPaymentStrictSend(r) => r.name(),
        OperationResultTr::CreateClaimableBalance(r) => r.name(),
        OperationResultTr::ClaimClaimableBalance(r) => r.name(),
        OperationResultTr::BeginSponsoringFutureReserves(r) => r.name(),
        OperationResultTr::EndSponsoringFutureReserves(r) => r.name(),
        OperationResultTr::RevokeSponsorship(r) => r.name(),
        OperationResultTr::Clawback(r) => r.name(),
        OperationResultTr::ClawbackClaimableBalance(r) => r.name(),
        OperationResultTr::SetTrustLineFlags(r) => r.name(),
        OperationResultTr::LiquidityPoolDeposit(r) => r.name(),
        OperationResultTr::LiquidityPoolWithdraw(r) => r.name(),
        OperationResultTr::InvokeHostFunction(r) => r.name(),
        OperationResultTr::ExtendFootprintTtl(r) => r.name(),
        OperationResultTr::RestoreFootprint(r) => r.name(),
    };
    format!("op_{}", snake_case(name))
}

/// `TxBadSeq` -> `tx_bad_seq`
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::encoding::to_base64_xdr;
    use stellar_xdr::curr::{LiquidityPoolDepositResult, PaymentResult, TransactionResultExt, VecM};

    fn failed_with(ops: Vec<OperationResult>) -> String {
        let ops: VecM<OperationResult> = ops.try_into().unwrap();
        to_base64_xdr(&TransactionResult {
            fee_charged: 200,
            result: TransactionResultResult::TxFailed(ops),
            ext: TransactionResultExt::V0,
        })
        .unwrap()
    }

    #[test]
    fn test_decode_bad_seq() {
        let codes = decode_result_codes("AAAAAAAAAGT////7AAAAAA==").unwrap();
        assert_eq!(codes.transaction, "tx_bad_seq");
        assert!(codes.operations.is_empty());
        assert_eq!(codes.to_string(), "tx_bad_seq");
    }

    #[test]
    fn test_decode_failed_operations() {
        let xdr = failed_with(vec![
            OperationResult::OpInner(OperationResultTr::Payment(PaymentResult::Underfunded)),
            OperationResult::OpInner(OperationResultTr::LiquidityPoolDeposit(
                LiquidityPoolDepositResult::BadPrice,
            )),
            OperationResult::OpBadAuth,
        ]);
        let codes = decode_result_codes(&xdr).unwrap();
        assert_eq!(codes.transaction, "tx_failed");
        assert_eq!(codes.operations, vec!["op_underfunded", "op_bad_price", "op_bad_auth"]);
        assert_eq!(
            codes.to_string(),
            "tx_failed [op_underfunded, op_bad_price, op_bad_auth]"
        );
    }

    #[test]
    fn test_ledger_record_fills_codes() {
        let record = ledger_record("aa", Some(9), Some("AAAAAAAAAGT////7AAAAAA==".to_string()));
        assert_eq!(record.ledger, Some(9));
        assert_eq!(record.result_codes.unwrap().transaction, "tx_bad_seq");

        let undecodable = ledger_record("bb", None, Some("AAAA".to_string()));
        assert_eq!(undecodable.result_xdr.as_deref(), Some("AAAA"));
        assert!(undecodable.result_codes.is_none());
    }

    #[test]
    fn test_rejection_detail() {
        assert_eq!(
            rejection_detail(Some("AAAAAAAAAGT////7AAAAAA==".to_string())),
            "tx_bad_seq"
        );
        assert_eq!(rejection_detail(Some("XDR".to_string())), "XDR");
        assert_eq!(rejection_detail(None), "no result");
    }
}
