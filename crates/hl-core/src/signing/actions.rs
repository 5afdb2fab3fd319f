//! User-signed account actions: transfers, withdrawals, agent and builder
//! approvals, multi-sig conversion.

use serde::{Deserialize, Serialize};

use super::domain::{signature_fields, Network, SignatureField};
use super::hash::{normalize_address, parse_address};
use super::signer::{sign_user_signed_action, Signature, Wallet};
use crate::types::{FieldMap, Value};
use crate::{Error, Result};

const USD_SEND_FIELDS: &[(&str, &str)] = &[
    ("hyperliquidChain", "string"),
    ("destination", "string"),
    ("amount", "string"),
    ("time", "uint64"),
];

const SPOT_SEND_FIELDS: &[(&str, &str)] = &[
    ("hyperliquidChain", "string"),
    ("destination", "string"),
    ("token", "string"),
    ("amount", "string"),
    ("time", "uint64"),
];

const WITHDRAW_FIELDS: &[(&str, &str)] = &[
    ("hyperliquidChain", "string"),
    ("destination", "string"),
    ("amount", "string"),
    ("time", "uint64"),
];

const USD_CLASS_TRANSFER_FIELDS: &[(&str, &str)] = &[
    ("hyperliquidChain", "string"),
    ("amount", "string"),
    ("toPerp", "bool"),
    ("nonce", "uint64"),
];

const CONVERT_TO_MULTI_SIG_USER_FIELDS: &[(&str, &str)] = &[
    ("hyperliquidChain", "string"),
    ("signers", "string"),
    ("nonce", "uint64"),
];

const APPROVE_AGENT_FIELDS: &[(&str, &str)] = &[
    ("hyperliquidChain", "string"),
    ("agentAddress", "address"),
    ("agentName", "string"),
    ("nonce", "uint64"),
];

const APPROVE_BUILDER_FEE_FIELDS: &[(&str, &str)] = &[
    ("hyperliquidChain", "string"),
    ("maxFeeRate", "string"),
    ("builder", "address"),
    ("nonce", "uint64"),
];

const SEND_MULTI_SIG_FIELDS: &[(&str, &str)] = &[
    ("hyperliquidChain", "string"),
    ("multiSigActionHash", "bytes32"),
    ("nonce", "uint64"),
];

/// Known user-signed action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserSignedKind {
    UsdSend,
    SpotSend,
    Withdraw,
    UsdClassTransfer,
    ConvertToMultiSigUser,
    ApproveAgent,
    ApproveBuilderFee,
    SendMultiSig,
}

impl UserSignedKind {
    pub const ALL: [UserSignedKind; 8] = [
        UserSignedKind::UsdSend,
        UserSignedKind::SpotSend,
        UserSignedKind::Withdraw,
        UserSignedKind::UsdClassTransfer,
        UserSignedKind::ConvertToMultiSigUser,
        UserSignedKind::ApproveAgent,
        UserSignedKind::ApproveBuilderFee,
        UserSignedKind::SendMultiSig,
    ];

    /// EIP-712 primary type name.
    pub fn primary_type(&self) -> &'static str {
        match self {
            UserSignedKind::UsdSend => "HyperliquidTransaction:UsdSend",
            UserSignedKind::SpotSend => "HyperliquidTransaction:SpotSend",
            UserSignedKind::Withdraw => "HyperliquidTransaction:Withdraw",
            UserSignedKind::UsdClassTransfer => "HyperliquidTransaction:UsdClassTransfer",
            UserSignedKind::ConvertToMultiSigUser => "HyperliquidTransaction:ConvertToMultiSigUser",
            UserSignedKind::ApproveAgent => "HyperliquidTransaction:ApproveAgent",
            UserSignedKind::ApproveBuilderFee => "HyperliquidTransaction:ApproveBuilderFee",
            UserSignedKind::SendMultiSig => "HyperliquidTransaction:SendMultiSig",
        }
    }

    fn field_table(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            UserSignedKind::UsdSend => USD_SEND_FIELDS,
            UserSignedKind::SpotSend => SPOT_SEND_FIELDS,
            UserSignedKind::Withdraw => WITHDRAW_FIELDS,
            UserSignedKind::UsdClassTransfer => USD_CLASS_TRANSFER_FIELDS,
            UserSignedKind::ConvertToMultiSigUser => CONVERT_TO_MULTI_SIG_USER_FIELDS,
            UserSignedKind::ApproveAgent => APPROVE_AGENT_FIELDS,
            UserSignedKind::ApproveBuilderFee => APPROVE_BUILDER_FEE_FIELDS,
            UserSignedKind::SendMultiSig => SEND_MULTI_SIG_FIELDS,
        }
    }

    /// Ordered field-type list, `hyperliquidChain` first.
    pub fn sign_types(&self) -> Vec<SignatureField> {
        signature_fields(self.field_table())
    }

    /// Fields the caller must supply; everything but the injected chain name.
    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> {
        self.field_table()
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| *name != "hyperliquidChain")
    }

    /// Fields that must hold a hex address, including ones typed as plain
    /// strings in the type list.
    pub fn address_fields(&self) -> &'static [&'static str] {
        match self {
            UserSignedKind::UsdSend | UserSignedKind::SpotSend | UserSignedKind::Withdraw => {
                &["destination"]
            }
            UserSignedKind::ApproveAgent => &["agentAddress"],
            UserSignedKind::ApproveBuilderFee => &["builder"],
            _ => &[],
        }
    }

    /// Check presence of required fields and the shape of address fields.
    pub fn validate(&self, action: &FieldMap) -> Result<()> {
        for field in self.required_fields() {
            if !action.contains_key(field) {
                return Err(Error::missing_field(field));
            }
        }
        for field in self.address_fields() {
            if let Some(value) = action.get_str(field) {
                parse_address(field, value)?;
            }
        }
        Ok(())
    }
}

/// Validate `action` against `kind` and sign it with the kind's type list.
pub fn sign_user_action<W>(
    wallet: &W,
    kind: UserSignedKind,
    action: &FieldMap,
    network: Network,
) -> Result<Signature>
where
    W: Wallet + ?Sized,
{
    kind.validate(action)?;
    sign_user_signed_action(wallet, action, &kind.sign_types(), kind.primary_type(), network)
}

pub fn create_usd_transfer_action(destination: &str, amount: &str, time: u64) -> Result<FieldMap> {
    Ok(FieldMap::with_capacity(3)
        .with("destination", normalize_address("destination", destination)?)
        .with("amount", amount)
        .with("time", time))
}

pub fn create_spot_transfer_action(
    destination: &str,
    token: &str,
    amount: &str,
    time: u64,
) -> Result<FieldMap> {
    Ok(FieldMap::with_capacity(4)
        .with("destination", normalize_address("destination", destination)?)
        .with("token", token)
        .with("amount", amount)
        .with("time", time))
}

pub fn create_withdraw_action(destination: &str, amount: &str, time: u64) -> Result<FieldMap> {
    create_usd_transfer_action(destination, amount, time)
}

pub fn create_usd_class_transfer_action(amount: &str, to_perp: bool, nonce: u64) -> FieldMap {
    FieldMap::with_capacity(3)
        .with("amount", amount)
        .with("toPerp", to_perp)
        .with("nonce", nonce)
}

/// `signers` is the JSON text `{"authorizedUsers": [...], "threshold": n}`.
/// An empty authorized-user list converts the account back to a normal user.
pub fn create_convert_to_multi_sig_user_action(
    authorized_users: &[&str],
    threshold: u32,
    nonce: u64,
) -> Result<FieldMap> {
    let mut users = authorized_users
        .iter()
        .map(|user| normalize_address("authorizedUsers", user))
        .collect::<Result<Vec<_>>>()?;
    users.sort();

    let signers = serde_json::json!({
        "authorizedUsers": users,
        "threshold": threshold,
    });

    Ok(FieldMap::with_capacity(2)
        .with("signers", signers.to_string())
        .with("nonce", nonce))
}

pub fn create_agent_action(agent_address: &str, agent_name: &str, nonce: u64) -> Result<FieldMap> {
    Ok(FieldMap::with_capacity(3)
        .with("agentAddress", normalize_address("agentAddress", agent_address)?)
        .with("agentName", agent_name)
        .with("nonce", nonce))
}

pub fn create_approve_builder_fee_action(
    max_fee_rate: &str,
    builder: &str,
    nonce: u64,
) -> Result<FieldMap> {
    Ok(FieldMap::with_capacity(3)
        .with("maxFeeRate", max_fee_rate)
        .with("builder", normalize_address("builder", builder)?)
        .with("nonce", nonce))
}

pub fn sign_usd_transfer_action<W: Wallet + ?Sized>(
    wallet: &W,
    action: &FieldMap,
    network: Network,
) -> Result<Signature> {
    sign_user_action(wallet, UserSignedKind::UsdSend, action, network)
}

pub fn sign_spot_transfer_action<W: Wallet + ?Sized>(
    wallet: &W,
    action: &FieldMap,
    network: Network,
) -> Result<Signature> {
    sign_user_action(wallet, UserSignedKind::SpotSend, action, network)
}

pub fn sign_withdraw_action<W: Wallet + ?Sized>(
    wallet: &W,
    action: &FieldMap,
    network: Network,
) -> Result<Signature> {
    sign_user_action(wallet, UserSignedKind::Withdraw, action, network)
}

pub fn sign_usd_class_transfer_action<W: Wallet + ?Sized>(
    wallet: &W,
    action: &FieldMap,
    network: Network,
) -> Result<Signature> {
    sign_user_action(wallet, UserSignedKind::UsdClassTransfer, action, network)
}

pub fn sign_convert_to_multi_sig_user_action<W: Wallet + ?Sized>(
    wallet: &W,
    action: &FieldMap,
    network: Network,
) -> Result<Signature> {
    sign_user_action(wallet, UserSignedKind::ConvertToMultiSigUser, action, network)
}

pub fn sign_agent_action<W: Wallet + ?Sized>(
    wallet: &W,
    action: &FieldMap,
    network: Network,
) -> Result<Signature> {
    sign_user_action(wallet, UserSignedKind::ApproveAgent, action, network)
}

pub fn sign_approve_builder_fee_action<W: Wallet + ?Sized>(
    wallet: &W,
    action: &FieldMap,
    network: Network,
) -> Result<Signature> {
    sign_user_action(wallet, UserSignedKind::ApproveBuilderFee, action, network)
}

/// Insert the submission tag, e.g. `"usdSend"`, in front of an action.
pub fn with_type_tag(tag: &str, action: &FieldMap) -> FieldMap {
    let mut tagged = FieldMap::with_capacity(action.len() + 1);
    tagged.insert("type", tag);
    for (key, value) in action.iter() {
        tagged.insert(key, value.clone());
    }
    tagged
}

impl From<&Signature> for Value {
    fn from(sig: &Signature) -> Self {
        Value::Map(
            FieldMap::with_capacity(3)
                .with("r", sig.r.as_str())
                .with("s", sig.s.as_str())
                .with("v", sig.v as u32),
        )
    }
}
