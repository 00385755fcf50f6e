//! Transaction assembly and signing.

use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    DecoratedSignature, Hash, Limits, Memo, Operation, Preconditions, SequenceNumber,
    Signature as XdrSignature, SignatureHint, TimeBounds, TimePoint, Transaction,
    TransactionEnvelope, TransactionExt, TransactionSignaturePayload,
    TransactionSignaturePayloadTaggedTransaction, TransactionV1Envelope, VecM, WriteXdr,
};

use super::encoding::to_base64_xdr;
use super::keys::muxed_account;
use crate::domain::{AccountState, AppError, ConfigError, Network, ValidationError};

/// Inclusion fee per operation, in stroops
pub const BASE_FEE: u32 = 100;

/// Validity window of every envelope
pub const TX_TIMEOUT_SECS: i64 = 30;

/// Builds fee-stamped, time-bounded envelopes for one network
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    network: Network,
    base_fee: u32,
    timeout: Duration,
}

impl TransactionBuilder {
    #[must_use]
    pub fn new(network: Network) -> Self {
        Self {
            network,
            base_fee: BASE_FEE,
            timeout: Duration::seconds(TX_TIMEOUT_SECS),
        }
    }

    /// Resolve the network by name. Anything other than `standalone` or
    /// `testnet` is a configuration error.
    pub fn for_network_name(name: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(name.parse()?))
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Assemble an unsigned transaction consuming the next sequence number
    /// of `source`.
    pub fn assemble(
        &self,
        source: &AccountState,
        operations: Vec<Operation>,
        now: DateTime<Utc>,
    ) -> Result<Transaction, ValidationError> {
        if operations.is_empty() {
            return Err(ValidationError::EmptyOperations);
        }
        let op_count = u32::try_from(operations.len())
            .map_err(|_| ValidationError::Xdr("too many operations".to_string()))?;
        let fee = self
            .base_fee
            .checked_mul(op_count)
            .ok_or_else(|| ValidationError::Xdr("fee overflow".to_string()))?;
        let max_time = u64::try_from((now + self.timeout).timestamp()).unwrap_or(0);

        Ok(Transaction {
            source_account: muxed_account(&source.account_id)?,
            fee,
            seq_num: SequenceNumber(source.sequence + 1),
            cond: Preconditions::Time(TimeBounds {
                min_time: TimePoint(0),
                max_time: TimePoint(max_time),
            }),
            memo: Memo::None,
            operations: operations.try_into()?,
            ext: TransactionExt::V0,
        })
    }

    /// Sign with the network passphrase baked into the hash
    pub fn sign(
        &self,
        tx: Transaction,
        signing_key: &SigningKey,
    ) -> Result<SignedEnvelope, ValidationError> {
        let hash = transaction_hash(&tx, self.network)?;
        let signature = signing_key.sign(&hash);
        let public_key = signing_key.verifying_key().to_bytes();
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&public_key[28..]);

        let decorated = DecoratedSignature {
            hint: SignatureHint(hint),
            signature: XdrSignature(signature.to_bytes().to_vec().try_into()?),
        };
        let signatures: VecM<DecoratedSignature, 20> = vec![decorated].try_into()?;

        Ok(SignedEnvelope {
            envelope: TransactionEnvelope::Tx(TransactionV1Envelope { tx, signatures }),
            hash,
        })
    }

    /// `assemble` followed by `sign`
    pub fn build(
        &self,
        source: &AccountState,
        signing_key: &SigningKey,
        operations: Vec<Operation>,
    ) -> Result<SignedEnvelope, AppError> {
        let tx = self.assemble(source, operations, Utc::now())?;
        Ok(self.sign(tx, signing_key)?)
    }
}

/// Hash that signatures commit to: SHA-256 over the network id and the
/// transaction.
pub fn transaction_hash(tx: &Transaction, network: Network) -> Result<[u8; 32], ValidationError> {
    let payload = TransactionSignaturePayload {
        network_id: Hash(network.network_id()),
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    let bytes = payload.to_xdr(Limits::none())?;
    Ok(Sha256::digest(bytes).into())
}

/// Base64 envelope with no signatures, as sent for simulation
pub fn unsigned_envelope_base64(tx: &Transaction) -> Result<String, ValidationError> {
    to_base64_xdr(&TransactionEnvelope::Tx(TransactionV1Envelope {
        tx: tx.clone(),
        signatures: VecM::default(),
    }))
}

/// A signed envelope. Immutable once built.
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    envelope: TransactionEnvelope,
    hash: [u8; 32],
}

impl SignedEnvelope {
    pub fn envelope(&self) -> &TransactionEnvelope {
        &self.envelope
    }

    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn to_base64(&self) -> Result<String, ValidationError> {
        to_base64_xdr(&self.envelope)
    }
}
