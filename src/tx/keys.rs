//! Keypairs and StrKey address handling.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use stellar_strkey::{Contract, ed25519};
use stellar_xdr::curr::{AccountId, ContractId, Hash, MuxedAccount, PublicKey, ScAddress, Uint256};

use crate::domain::{TestAccount, ValidationError};

impl TestAccount {
    /// Generate a fresh random keypair
    #[must_use]
    pub fn random() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(&signing_key)
    }

    #[must_use]
    pub fn from_signing_key(signing_key: &SigningKey) -> Self {
        let public_key = ed25519::PublicKey(signing_key.verifying_key().to_bytes()).to_string();
        let secret = ed25519::PrivateKey(signing_key.to_bytes()).to_string();
        Self {
            public_key,
            secret: SecretString::from(secret),
        }
    }

    /// Rebuild an account from an `S...` secret seed
    pub fn from_secret(secret: &str) -> Result<Self, ValidationError> {
        let signing_key = signing_key_from_secret(&SecretString::from(secret.to_string()))?;
        Ok(Self::from_signing_key(&signing_key))
    }

    pub fn signing_key(&self) -> Result<SigningKey, ValidationError> {
        signing_key_from_secret(&self.secret)
    }
}

/// Parse a StrKey secret seed into a signing key
pub fn signing_key_from_secret(secret: &SecretString) -> Result<SigningKey, ValidationError> {
    let seed = ed25519::PrivateKey::from_string(secret.expose_secret())
        .map_err(|_| ValidationError::InvalidSecret)?;
    Ok(SigningKey::from_bytes(&seed.0))
}

/// Raw ed25519 bytes of a `G...` account address
pub fn decode_account(address: &str) -> Result<[u8; 32], ValidationError> {
    ed25519::PublicKey::from_string(address)
        .map(|pk| pk.0)
        .map_err(|_| ValidationError::InvalidAddress(address.to_string()))
}

/// Raw hash of a `C...` contract address
pub fn decode_contract(address: &str) -> Result<[u8; 32], ValidationError> {
    Contract::from_string(address)
        .map(|c| c.0)
        .map_err(|_| ValidationError::InvalidAddress(address.to_string()))
}

pub fn account_id(address: &str) -> Result<AccountId, ValidationError> {
    let bytes = decode_account(address)?;
    Ok(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(bytes))))
}

pub fn muxed_account(address: &str) -> Result<MuxedAccount, ValidationError> {
    let bytes = decode_account(address)?;
    Ok(MuxedAccount::Ed25519(Uint256(bytes)))
}

/// Contract-facing address for either an account (`G...`) or a contract (`C...`)
pub fn sc_address(address: &str) -> Result<ScAddress, ValidationError> {
    match address.chars().next() {
        Some('G') => Ok(ScAddress::Account(account_id(address)?)),
        Some('C') => Ok(ScAddress::Contract(ContractId(Hash(decode_contract(
            address,
        )?)))),
        _ => Err(ValidationError::InvalidAddress(address.to_string())),
    }
}
