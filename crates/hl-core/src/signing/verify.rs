//! Signature verification.

use alloy_primitives::{keccak256, Address, B256};
use tracing::trace;

use super::hash::parse_address;
use super::signer::Signature;
use crate::{Error, Result};

const PERSONAL_SIGN_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Personal-message digest: `keccak256("\x19Ethereum Signed Message:\n" ‖ len ‖ message)`.
pub fn hash_message(message: &[u8]) -> B256 {
    let len = message.len().to_string();
    let mut data = Vec::with_capacity(PERSONAL_SIGN_PREFIX.len() + len.len() + message.len());
    data.extend_from_slice(PERSONAL_SIGN_PREFIX.as_bytes());
    data.extend_from_slice(len.as_bytes());
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Recover the address that produced `signature` over `message`.
pub fn recover_address(message: &[u8], signature: &Signature) -> Result<Address> {
    let ecdsa = alloy_primitives::Signature::try_from(signature)?;
    ecdsa
        .recover_address_from_prehash(&hash_message(message))
        .map_err(|e| Error::decode(format!("public key recovery failed: {e}")))
}

/// Check that `signature` over `message` was produced by `address`.
///
/// Returns `Ok(false)` for a well-formed signature from a different signer;
/// malformed input is an error.
pub fn verify_signature(address: &str, message: &[u8], signature: &Signature) -> Result<bool> {
    let expected = parse_address("address", address)?;
    let recovered = recover_address(message, signature)?;

    trace!(%expected, %recovered, "Recovered signer");
    Ok(recovered == expected)
}
