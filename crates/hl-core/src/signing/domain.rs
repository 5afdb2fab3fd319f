//! EIP-712 domains, field-type descriptors and network selection.
//!
//! The exchange signs under exactly two domains: the "Exchange" domain for L1
//! actions (wrapped in a phantom agent) and the "HyperliquidSignTransaction"
//! domain for user-signed account actions.

use std::str::FromStr;

use alloy_primitives::Address;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Chain ID of the L1 "Exchange" domain.
pub const EXCHANGE_CHAIN_ID: u64 = 1337;

/// Chain ID of the user-signed transaction domain.
pub const SIGN_TRANSACTION_CHAIN_ID: u64 = 421614;

/// Value injected as `signatureChainId` into every user-signed action.
pub const SIGNATURE_CHAIN_ID: &str = "0x66eee";

/// Field types of the `EIP712Domain` struct, in declaration order.
pub const EIP712_DOMAIN_FIELDS: &[(&str, &str)] = &[
    ("name", "string"),
    ("version", "string"),
    ("chainId", "uint256"),
    ("verifyingContract", "address"),
];

/// Field types of the phantom agent struct signed for L1 actions.
pub const AGENT_FIELDS: &[(&str, &str)] = &[("source", "string"), ("connectionId", "bytes32")];

/// Which exchange network an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    #[serde(alias = "Mainnet")]
    Mainnet,
    #[serde(alias = "Testnet")]
    Testnet,
}

impl Network {
    pub fn from_is_mainnet(is_mainnet: bool) -> Self {
        if is_mainnet {
            Network::Mainnet
        } else {
            Network::Testnet
        }
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self, Network::Mainnet)
    }

    /// Phantom agent `source` tag.
    pub fn phantom_source(&self) -> &'static str {
        match self {
            Network::Mainnet => "a",
            Network::Testnet => "b",
        }
    }

    /// Value of the `hyperliquidChain` field in user-signed actions.
    pub fn chain_name(&self) -> &'static str {
        match self {
            Network::Mainnet => "Mainnet",
            Network::Testnet => "Testnet",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.chain_name())
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(Error::Config {
                message: format!("unknown network: {other}"),
            }),
        }
    }
}

/// EIP-712 domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip712Domain {
    /// Domain name.
    pub name: String,
    /// Domain version.
    pub version: String,
    /// Chain ID.
    pub chain_id: u64,
    /// Verifying contract address.
    pub verifying_contract: Address,
}

impl Eip712Domain {
    /// Domain for L1 actions signed through a phantom agent.
    pub fn exchange() -> Self {
        Self::custom("Exchange", "1", EXCHANGE_CHAIN_ID, Address::ZERO)
    }

    /// Domain for user-signed account actions.
    pub fn sign_transaction() -> Self {
        Self::custom(
            "HyperliquidSignTransaction",
            "1",
            SIGN_TRANSACTION_CHAIN_ID,
            Address::ZERO,
        )
    }

    /// Create domain with custom parameters.
    pub fn custom(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }
}

impl Serialize for Eip712Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("version", &self.version)?;
        map.serialize_entry("chainId", &self.chain_id)?;
        map.serialize_entry(
            "verifyingContract",
            &super::hash::address_to_hex(&self.verifying_contract),
        )?;
        map.end()
    }
}

/// One `(name, type)` entry of an EIP-712 struct type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl SignatureField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Build an owned field-type list from a static table.
pub fn signature_fields(table: &[(&str, &str)]) -> Vec<SignatureField> {
    table
        .iter()
        .map(|(name, ty)| SignatureField::new(*name, *ty))
        .collect()
}
