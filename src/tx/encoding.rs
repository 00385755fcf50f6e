//! XDR and hex encoding helpers.

use base64::prelude::{BASE64_STANDARD, Engine};
use stellar_xdr::curr::{Limits, ReadXdr, WriteXdr};

use crate::domain::ValidationError;

pub fn to_base64_xdr<T: WriteXdr>(value: &T) -> Result<String, ValidationError> {
    let bytes = value.to_xdr(Limits::none())?;
    Ok(BASE64_STANDARD.encode(bytes))
}

pub fn from_base64_xdr<T: ReadXdr>(encoded: &str) -> Result<T, ValidationError> {
    let bytes = BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|e| ValidationError::Xdr(format!("invalid base64: {}", e)))?;
    Ok(T::from_xdr(bytes, Limits::none())?)
}

/// Decode a hex string. Odd lengths are rejected rather than truncated.
pub fn hex_to_bytes(input: &str) -> Result<Vec<u8>, ValidationError> {
    if input.len() % 2 != 0 {
        return Err(ValidationError::OddLengthHex(input.len()));
    }
    hex::decode(input).map_err(|e| ValidationError::InvalidHex(e.to_string()))
}

/// Decode a hex string that must hold exactly 32 bytes (hashes, pool ids)
pub fn hex_to_hash(input: &str) -> Result<[u8; 32], ValidationError> {
    let bytes = hex_to_bytes(input)?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        ValidationError::InvalidHex(format!("expected 32 bytes, got {}", v.len()))
    })
}
