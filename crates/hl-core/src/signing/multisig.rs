//! Multi-signature payloads.
//!
//! Each co-signer signs the inner action enriched with the multi-sig user and
//! the outer signer. The outer signer then wraps the inner action's digest in
//! a `SendMultiSig` envelope.

use serde::Serialize;
use tracing::debug;

use super::actions::UserSignedKind;
use super::domain::{Network, SignatureField};
use super::hash::{action_hash, address_to_hex, digest_to_hex, normalize_address};
use super::signer::{
    sign_l1_action, sign_user_signed_action, Signature, Wallet, ACTION_TYPE_FIELD,
    HYPERLIQUID_CHAIN_FIELD,
};
use crate::types::{FieldMap, Value};
use crate::{Error, Result};

pub const PAYLOAD_MULTI_SIG_USER_FIELD: &str = "payloadMultiSigUser";
pub const OUTER_SIGNER_FIELD: &str = "outerSigner";

/// Splice `payloadMultiSigUser` and `outerSigner` right after the
/// `hyperliquidChain` entry.
pub fn add_multi_sig_types(sign_types: &[SignatureField]) -> Result<Vec<SignatureField>> {
    let position = sign_types
        .iter()
        .position(|field| field.name == HYPERLIQUID_CHAIN_FIELD)
        .ok_or(Error::InvalidSignatureChain)?;

    let mut enriched = Vec::with_capacity(sign_types.len() + 2);
    enriched.extend_from_slice(&sign_types[..=position]);
    enriched.push(SignatureField::new(PAYLOAD_MULTI_SIG_USER_FIELD, "address"));
    enriched.push(SignatureField::new(OUTER_SIGNER_FIELD, "address"));
    enriched.extend_from_slice(&sign_types[position + 1..]);
    Ok(enriched)
}

/// Copy of `action` with both multi-sig addresses added, lower-cased.
pub fn add_multi_sig_fields(
    action: &FieldMap,
    payload_multi_sig_user: &str,
    outer_signer: &str,
) -> Result<FieldMap> {
    let user = normalize_address(PAYLOAD_MULTI_SIG_USER_FIELD, payload_multi_sig_user)?;
    let outer = normalize_address(OUTER_SIGNER_FIELD, outer_signer)?;

    let mut enriched = action.clone();
    enriched.insert(PAYLOAD_MULTI_SIG_USER_FIELD, user);
    enriched.insert(OUTER_SIGNER_FIELD, outer);
    Ok(enriched)
}

/// Co-signer signature over a user-signed inner action.
pub fn sign_multi_sig_user_signed_action_payload<W>(
    wallet: &W,
    action: &FieldMap,
    sign_types: &[SignatureField],
    primary_type: &str,
    payload_multi_sig_user: &str,
    outer_signer: &str,
    network: Network,
) -> Result<Signature>
where
    W: Wallet + ?Sized,
{
    let enriched = add_multi_sig_fields(action, payload_multi_sig_user, outer_signer)?;
    let enriched_types = add_multi_sig_types(sign_types)?;
    sign_user_signed_action(wallet, &enriched, &enriched_types, primary_type, network)
}

/// Co-signer signature over an L1 inner action.
///
/// The hashed payload is the sequence `[payloadMultiSigUser, outerSigner, action]`.
pub fn sign_multi_sig_l1_action_payload<W, T>(
    wallet: &W,
    action: &T,
    vault_address: Option<&str>,
    nonce: u64,
    payload_multi_sig_user: &str,
    outer_signer: &str,
    network: Network,
) -> Result<Signature>
where
    W: Wallet + ?Sized,
    T: Serialize + ?Sized,
{
    let user = normalize_address(PAYLOAD_MULTI_SIG_USER_FIELD, payload_multi_sig_user)?;
    let outer = normalize_address(OUTER_SIGNER_FIELD, outer_signer)?;

    sign_l1_action(wallet, &(user, outer, action), vault_address, nonce, network)
}

/// Outer-signer signature over the digest of `action` without its `type` tag.
pub fn sign_multi_sig_action<W>(
    wallet: &W,
    action: &FieldMap,
    vault_address: Option<&str>,
    nonce: u64,
    network: Network,
) -> Result<Signature>
where
    W: Wallet + ?Sized,
{
    let mut untagged = action.clone();
    untagged.remove(ACTION_TYPE_FIELD);

    let digest = action_hash(&untagged, vault_address, nonce)?;
    let envelope = FieldMap::with_capacity(2)
        .with("multiSigActionHash", digest_to_hex(&digest))
        .with("nonce", nonce);

    let kind = UserSignedKind::SendMultiSig;
    sign_user_signed_action(wallet, &envelope, &kind.sign_types(), kind.primary_type(), network)
}

/// Sign a multi-sig action and build its submission envelope.
pub fn create_multi_sig_action<W>(
    inner_action: &FieldMap,
    wallet: &W,
    vault_address: Option<&str>,
    nonce: u64,
    network: Network,
) -> Result<(FieldMap, Signature)>
where
    W: Wallet + ?Sized,
{
    let signature = sign_multi_sig_action(wallet, inner_action, vault_address, nonce, network)?;
    let signer = address_to_hex(&wallet.address());

    let mut envelope = FieldMap::with_capacity(6)
        .with("type", "sendMultiSig")
        .with("wallet", signer.as_str());
    if let Some(vault) = vault_address.filter(|v| !v.is_empty()) {
        envelope.insert("vaultAddress", normalize_address("vaultAddress", vault)?);
    }
    envelope.insert("nonce", nonce);
    envelope.insert("action", inner_action.clone());
    envelope.insert("signature", Value::from(&signature));

    debug!(nonce, signer = %signer, "Created multi-sig action");
    Ok((envelope, signature))
}
