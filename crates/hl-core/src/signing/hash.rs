//! Canonical action hashing and the phantom agent.
//!
//! L1 actions are not signed directly. Their msgpack encoding, the nonce and
//! an optional vault tag are hashed with Keccak-256 and the digest is wrapped
//! in a small "Agent" struct that is signed instead.

use alloy_primitives::{keccak256, Address, B256};
use serde::Serialize;

use super::domain::Network;
use crate::types::FieldMap;
use crate::{Error, Result};

/// Parse a `0x`-prefixed (or bare) 40-character hex address.
///
/// `field` names the payload field the value came from, for error reporting.
pub fn parse_address(field: &str, value: &str) -> Result<Address> {
    let hex_part = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    if hex_part.len() != 40 {
        return Err(Error::invalid_address(field, value));
    }
    let bytes = hex::decode(hex_part).map_err(|_| Error::invalid_address(field, value))?;
    Ok(Address::from_slice(&bytes))
}

/// Lower-case `0x` hex form used in every signed payload.
pub fn address_to_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

/// Validate an address and return its lower-cased form.
pub fn normalize_address(field: &str, value: &str) -> Result<String> {
    parse_address(field, value).map(|addr| address_to_hex(&addr))
}

pub(crate) fn digest_to_hex(digest: &B256) -> String {
    format!("0x{}", hex::encode(digest.as_slice()))
}

/// Compute the digest of an action for L1 signing.
///
/// Layout: `msgpack(action) ‖ nonce (u64 BE) ‖ 0x00` without a vault, or
/// `… ‖ 0x01 ‖ vault (20 bytes)` with one. An empty vault string counts as
/// no vault.
pub fn action_hash<T>(action: &T, vault_address: Option<&str>, nonce: u64) -> Result<B256>
where
    T: Serialize + ?Sized,
{
    let vault = vault_address
        .filter(|v| !v.is_empty())
        .map(|v| parse_address("vaultAddress", v))
        .transpose()?;

    let mut data = rmp_serde::to_vec_named(action)
        .map_err(|e| Error::encoding(format!("marshalling action: {e}")))?;

    data.extend_from_slice(&nonce.to_be_bytes());

    match vault {
        None => data.push(0),
        Some(addr) => {
            data.push(1);
            data.extend_from_slice(addr.as_slice());
        }
    }

    Ok(keccak256(&data))
}

/// The struct actually signed for L1 actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhantomAgent {
    /// `"a"` on mainnet, `"b"` otherwise.
    pub source: &'static str,
    /// The action digest.
    pub connection_id: B256,
}

impl PhantomAgent {
    pub fn new(digest: B256, network: Network) -> Self {
        Self {
            source: network.phantom_source(),
            connection_id: digest,
        }
    }

    /// Typed-data message form: `{source, connectionId}`.
    pub fn to_message(&self) -> FieldMap {
        FieldMap::with_capacity(2)
            .with("source", self.source)
            .with("connectionId", digest_to_hex(&self.connection_id))
    }
}
