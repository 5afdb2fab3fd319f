//! Signing orchestration for L1 and user-signed actions.
//!
//! Both flows end in the same place: a [`TypedData`] envelope whose msgpack
//! encoding is handed to the [`Wallet`] capability. Key material never enters
//! this crate.

use std::collections::HashSet;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{
    signature_fields, Eip712Domain, Network, SignatureField, AGENT_FIELDS, SIGNATURE_CHAIN_ID,
};
use super::hash::{action_hash, normalize_address, PhantomAgent};
use super::typed_data::TypedData;
use crate::types::{FieldMap, Value};
use crate::{Error, Result};

/// Field carrying the network name in user-signed actions.
pub const HYPERLIQUID_CHAIN_FIELD: &str = "hyperliquidChain";

/// Field carrying [`SIGNATURE_CHAIN_ID`] in user-signed actions.
pub const SIGNATURE_CHAIN_ID_FIELD: &str = "signatureChainId";

/// Submission tag of an action; never part of a typed message.
pub const ACTION_TYPE_FIELD: &str = "type";

/// Fields that always carry an address, even where the type list declares
/// them as `string`.
pub const ADDRESS_SHAPED_FIELDS: &[&str] = &[
    "destination",
    "agentAddress",
    "builder",
    "payloadMultiSigUser",
    "outerSigner",
];

/// ECDSA signature with 32-byte big-endian `r`/`s` as `0x` hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub r: String,
    pub s: String,
    pub v: u8,
}

impl Signature {
    pub fn from_rsv(r: &[u8; 32], s: &[u8; 32], v: u8) -> Self {
        Self {
            r: format!("0x{}", hex::encode(r)),
            s: format!("0x{}", hex::encode(s)),
            v,
        }
    }

    /// Parse a 65-byte `r ‖ s ‖ v` signature. `v` may be 0/1 or 27/28.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 65 {
            return Err(Error::decode(format!(
                "expected 65 signature bytes, got {}",
                bytes.len()
            )));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        let v = match bytes[64] {
            v @ (0 | 1) => v + 27,
            v => v,
        };
        Ok(Self::from_rsv(&r, &s, v))
    }

    /// Pack as 65 bytes `r ‖ s ‖ v`.
    pub fn to_bytes(&self) -> Result<[u8; 65]> {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&decode_word("r", &self.r)?);
        out[32..64].copy_from_slice(&decode_word("s", &self.s)?);
        out[64] = self.v;
        Ok(out)
    }

    /// Recovery parity, accepting both the 0/1 and 27/28 conventions.
    pub fn y_parity(&self) -> Result<bool> {
        match self.v {
            0 | 27 => Ok(false),
            1 | 28 => Ok(true),
            v => Err(Error::decode(format!("invalid recovery byte: {v}"))),
        }
    }
}

impl From<alloy_primitives::Signature> for Signature {
    fn from(sig: alloy_primitives::Signature) -> Self {
        let r = sig.r().to_be_bytes::<32>();
        let s = sig.s().to_be_bytes::<32>();
        Self::from_rsv(&r, &s, 27 + sig.v() as u8)
    }
}

impl TryFrom<&Signature> for alloy_primitives::Signature {
    type Error = Error;

    fn try_from(sig: &Signature) -> Result<Self> {
        let r = U256::from_be_bytes(decode_word("r", &sig.r)?);
        let s = U256::from_be_bytes(decode_word("s", &sig.s)?);
        Ok(alloy_primitives::Signature::new(r, s, sig.y_parity()?))
    }
}

fn decode_word(name: &str, value: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(value.strip_prefix("0x").unwrap_or(value))
        .map_err(|e| Error::decode(format!("invalid {name} value: {e}")))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| Error::decode(format!("{name} must be 32 bytes, got {}", b.len())))
}

/// Signing capability: signs an opaque byte buffer and reports its address.
#[cfg_attr(test, mockall::automock)]
pub trait Wallet: Send + Sync {
    fn address(&self) -> Address;

    fn sign_message(&self, message: &[u8]) -> Result<Signature>;
}

/// Encode an envelope and hand it to the wallet.
pub fn sign_typed_data<W>(wallet: &W, typed_data: &TypedData) -> Result<Signature>
where
    W: Wallet + ?Sized,
{
    let encoded = typed_data.encode()?;
    wallet.sign_message(&encoded)
}

/// Envelope signed for an L1 action: a phantom agent over the action digest.
pub fn l1_typed_data<T>(
    action: &T,
    vault_address: Option<&str>,
    nonce: u64,
    network: Network,
) -> Result<TypedData>
where
    T: Serialize + ?Sized,
{
    let digest = action_hash(action, vault_address, nonce)?;
    let agent = PhantomAgent::new(digest, network);

    Ok(TypedData::assemble(
        Eip712Domain::exchange(),
        "Agent",
        agent.to_message(),
        vec![("Agent".to_string(), signature_fields(AGENT_FIELDS))],
    ))
}

/// Sign an action addressed directly to the matching engine.
pub fn sign_l1_action<W, T>(
    wallet: &W,
    action: &T,
    vault_address: Option<&str>,
    nonce: u64,
    network: Network,
) -> Result<Signature>
where
    W: Wallet + ?Sized,
    T: Serialize + ?Sized,
{
    let typed_data = l1_typed_data(action, vault_address, nonce, network)?;
    let signature = sign_typed_data(wallet, &typed_data)?;

    debug!(
        nonce,
        network = %network,
        vault = vault_address.unwrap_or(""),
        "Signed L1 action"
    );
    Ok(signature)
}

/// Envelope signed for a user-signed action.
///
/// The message holds the declared fields in `sign_types` order, with
/// `hyperliquidChain` set from `network`, followed by `signatureChainId`.
/// Fields of `action` that the type list does not declare are rejected, except
/// the `type` submission tag and the two injected fields. Address-typed fields
/// and [`ADDRESS_SHAPED_FIELDS`] are validated and lower-cased.
pub fn user_signed_typed_data(
    action: &FieldMap,
    sign_types: &[SignatureField],
    primary_type: &str,
    network: Network,
) -> Result<TypedData> {
    let declared: HashSet<&str> = sign_types.iter().map(|f| f.name.as_str()).collect();

    for key in action.keys() {
        let injected = matches!(
            key,
            ACTION_TYPE_FIELD | SIGNATURE_CHAIN_ID_FIELD | HYPERLIQUID_CHAIN_FIELD
        );
        if !injected && !declared.contains(key) {
            return Err(Error::UnexpectedField {
                field: key.to_string(),
                primary_type: primary_type.to_string(),
            });
        }
    }

    let mut message = FieldMap::with_capacity(sign_types.len() + 2);
    for field in sign_types {
        let value = if field.name == HYPERLIQUID_CHAIN_FIELD {
            Value::from(network.chain_name())
        } else {
            action
                .get(&field.name)
                .cloned()
                .ok_or_else(|| Error::missing_field(field.name.as_str()))?
        };

        let value = if is_address_shaped(field) {
            let text = value
                .as_str()
                .ok_or_else(|| Error::invalid_address(field.name.as_str(), format!("{value:?}")))?;
            Value::from(normalize_address(&field.name, text)?)
        } else {
            value
        };
        message.insert(field.name.as_str(), value);
    }
    if !declared.contains(HYPERLIQUID_CHAIN_FIELD) {
        message.insert(HYPERLIQUID_CHAIN_FIELD, network.chain_name());
    }
    message.insert(SIGNATURE_CHAIN_ID_FIELD, SIGNATURE_CHAIN_ID);

    Ok(TypedData::assemble(
        Eip712Domain::sign_transaction(),
        primary_type,
        message,
        vec![(primary_type.to_string(), sign_types.to_vec())],
    ))
}

fn is_address_shaped(field: &SignatureField) -> bool {
    field.type_name == "address" || ADDRESS_SHAPED_FIELDS.contains(&field.name.as_str())
}

/// Sign an account-level action under the transaction domain.
pub fn sign_user_signed_action<W>(
    wallet: &W,
    action: &FieldMap,
    sign_types: &[SignatureField],
    primary_type: &str,
    network: Network,
) -> Result<Signature>
where
    W: Wallet + ?Sized,
{
    let typed_data = user_signed_typed_data(action, sign_types, primary_type, network)?;
    let signature = sign_typed_data(wallet, &typed_data)?;

    debug!(primary_type, network = %network, "Signed user action");
    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::domain::signature_fields;

    const USD_SEND: &[(&str, &str)] = &[
        ("hyperliquidChain", "string"),
        ("destination", "string"),
        ("amount", "string"),
        ("time", "uint64"),
    ];

    fn usd_send_action() -> FieldMap {
        FieldMap::new()
            .with("destination", "0x5e9ee1089755c3435139848e47e6635505d5a13a")
            .with("amount", "1")
            .with("time", 1687816341423u64)
    }

    fn fixed_signature() -> Signature {
        Signature::from_rsv(&[1u8; 32], &[2u8; 32], 27)
    }

    #[test]
    fn test_signature_bytes_round_trip() {
        let sig = fixed_signature();
        let bytes = sig.to_bytes().unwrap();
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[63], 2);
        assert_eq!(bytes[64], 27);
        assert_eq!(Signature::from_bytes(&bytes).unwrap(), sig);
    }

    #[test]
    fn test_signature_normalizes_parity_byte() {
        let mut bytes = [0u8; 65];
        bytes[64] = 1;
        let sig = Signature::from_bytes(&bytes).unwrap();
        assert_eq!(sig.v, 28);
        assert!(sig.y_parity().unwrap());
    }

    #[test]
    fn test_signature_rejects_bad_components() {
        assert!(Signature::from_bytes(&[0u8; 64]).is_err());

        let short = Signature {
            r: "0x1234".to_string(),
            s: fixed_signature().s,
            v: 27,
        };
        assert!(matches!(short.to_bytes(), Err(Error::Decode { .. })));

        let bad_v = Signature {
            v: 5,
            ..fixed_signature()
        };
        assert!(bad_v.y_parity().is_err());
    }

    #[test]
    fn test_l1_typed_data_shape() {
        let action = FieldMap::new().with("type", "scheduleCancel");
        let typed = l1_typed_data(&action, None, 1, Network::Testnet).unwrap();

        assert_eq!(typed.primary_type, "Agent");
        assert_eq!(typed.domain, Eip712Domain::exchange());
        assert_eq!(typed.message.get_str("source"), Some("b"));

        let digest = action_hash(&action, None, 1).unwrap();
        assert_eq!(
            typed.message.get_str("connectionId").unwrap(),
            format!("0x{}", hex::encode(digest))
        );
    }

    #[test]
    fn test_sign_l1_action_hands_envelope_to_wallet() {
        let action = FieldMap::new().with("type", "noop");
        let expected = l1_typed_data(&action, None, 9, Network::Mainnet)
            .unwrap()
            .encode()
            .unwrap();

        let mut wallet = MockWallet::new();
        wallet
            .expect_sign_message()
            .withf(move |message| message.to_vec() == expected)
            .times(1)
            .returning(|_| Ok(fixed_signature()));

        let sig = sign_l1_action(&wallet, &action, None, 9, Network::Mainnet).unwrap();
        assert_eq!(sig, fixed_signature());
    }

    #[test]
    fn test_sign_l1_action_bad_vault_never_signs() {
        let mut wallet = MockWallet::new();
        wallet.expect_sign_message().times(0);

        let action = FieldMap::new().with("type", "noop");
        let err = sign_l1_action(&wallet, &action, Some("0x12"), 1, Network::Mainnet).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { .. }));
    }

    #[test]
    fn test_user_signed_message_order_and_injection() {
        let types = signature_fields(USD_SEND);
        let typed = user_signed_typed_data(
            &usd_send_action(),
            &types,
            "HyperliquidTransaction:UsdSend",
            Network::Testnet,
        )
        .unwrap();

        assert_eq!(typed.domain, Eip712Domain::sign_transaction());
        assert_eq!(
            typed.message.keys().collect::<Vec<_>>(),
            vec!["hyperliquidChain", "destination", "amount", "time", "signatureChainId"]
        );
        assert_eq!(typed.message.get_str("hyperliquidChain"), Some("Testnet"));
        assert_eq!(typed.message.get_str("signatureChainId"), Some("0x66eee"));
        assert_eq!(
            typed.type_fields("HyperliquidTransaction:UsdSend").unwrap(),
            types.as_slice()
        );
    }

    #[test]
    fn test_user_signed_ignores_type_tag_and_overrides_chain() {
        let types = signature_fields(USD_SEND);
        let action = usd_send_action()
            .with("type", "usdSend")
            .with("hyperliquidChain", "Testnet");

        let typed =
            user_signed_typed_data(&action, &types, "HyperliquidTransaction:UsdSend", Network::Mainnet)
                .unwrap();
        assert!(!typed.message.contains_key("type"));
        assert_eq!(typed.message.get_str("hyperliquidChain"), Some("Mainnet"));
    }

    #[test]
    fn test_user_signed_rejects_undeclared_field() {
        let mut wallet = MockWallet::new();
        wallet.expect_sign_message().times(0);

        let types = signature_fields(USD_SEND);
        let action = usd_send_action().with("memo", "hello");
        let err = sign_user_signed_action(
            &wallet,
            &action,
            &types,
            "HyperliquidTransaction:UsdSend",
            Network::Mainnet,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnexpectedField { ref field, .. } if field == "memo"));
    }

    #[test]
    fn test_user_signed_requires_declared_fields() {
        let types = signature_fields(USD_SEND);
        let mut action = usd_send_action();
        action.remove("time");

        let err =
            user_signed_typed_data(&action, &types, "HyperliquidTransaction:UsdSend", Network::Mainnet)
                .unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field } if field == "time"));
    }

    #[test]
    fn test_user_signed_validates_address_typed_fields() {
        let types = vec![
            SignatureField::new("hyperliquidChain", "string"),
            SignatureField::new("agentAddress", "address"),
        ];
        let action = FieldMap::new().with("agentAddress", "not-an-address");

        let err = user_signed_typed_data(&action, &types, "Test", Network::Mainnet).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { ref field, .. } if field == "agentAddress"));
    }

    #[test]
    fn test_user_signed_lowercases_addresses() {
        let types = vec![
            SignatureField::new("hyperliquidChain", "string"),
            SignatureField::new("agentAddress", "address"),
            SignatureField::new("destination", "string"),
        ];
        let action = FieldMap::new()
            .with("agentAddress", "0xABCDEF0000000000000000000000000000000001")
            .with("destination", "0x5E9EE1089755C3435139848E47E6635505D5A13A");

        let typed = user_signed_typed_data(&action, &types, "Test", Network::Mainnet).unwrap();
        assert_eq!(
            typed.message.get_str("agentAddress"),
            Some("0xabcdef0000000000000000000000000000000001")
        );
        assert_eq!(
            typed.message.get_str("destination"),
            Some("0x5e9ee1089755c3435139848e47e6635505d5a13a")
        );
    }

    #[test]
    fn test_user_signed_rejects_string_typed_destination() {
        let mut wallet = MockWallet::new();
        wallet.expect_sign_message().times(0);

        let types = signature_fields(USD_SEND);
        let action = usd_send_action().with("destination", "alice");
        let err = sign_user_signed_action(
            &wallet,
            &action,
            &types,
            "HyperliquidTransaction:UsdSend",
            Network::Mainnet,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { ref field, .. } if field == "destination"));
    }

    #[test]
    fn test_wallet_errors_propagate() {
        let mut wallet = MockWallet::new();
        wallet.expect_sign_message().returning(|_| {
            Err(Error::Signing {
                message: "device unavailable".to_string(),
            })
        });

        let action = FieldMap::new().with("type", "noop");
        let err = sign_l1_action(&wallet, &action, None, 1, Network::Mainnet).unwrap_err();
        assert!(matches!(err, Error::Signing { .. }));
    }
}
