//! Typed-data envelopes handed to the wallet.
//!
//! The wallet signs the msgpack encoding of this envelope. Every map in it
//! has a fixed key order: `domain, primaryType, types, message` at the top,
//! `EIP712Domain` first inside `types`, then caller types in supplied order.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::domain::{signature_fields, Eip712Domain, SignatureField, EIP712_DOMAIN_FIELDS};
use crate::types::FieldMap;
use crate::{Error, Result};

pub const EIP712_DOMAIN_TYPE: &str = "EIP712Domain";

/// Named struct type definitions, in declaration order.
pub type TypeDefs = Vec<(String, Vec<SignatureField>)>;

/// `{domain, primaryType, types, message}` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedData {
    pub domain: Eip712Domain,
    pub primary_type: String,
    pub types: TypeDefs,
    pub message: FieldMap,
}

impl TypedData {
    /// Build an envelope, adding the `EIP712Domain` descriptor to `type_defs`.
    ///
    /// A caller-supplied `EIP712Domain` entry is replaced by the fixed one.
    pub fn assemble(
        domain: Eip712Domain,
        primary_type: impl Into<String>,
        message: FieldMap,
        type_defs: TypeDefs,
    ) -> Self {
        let mut types = Vec::with_capacity(type_defs.len() + 1);
        types.push((
            EIP712_DOMAIN_TYPE.to_string(),
            signature_fields(EIP712_DOMAIN_FIELDS),
        ));
        types.extend(
            type_defs
                .into_iter()
                .filter(|(name, _)| name != EIP712_DOMAIN_TYPE),
        );

        Self {
            domain,
            primary_type: primary_type.into(),
            types,
            message,
        }
    }

    pub fn type_fields(&self, name: &str) -> Option<&[SignatureField]> {
        self.types
            .iter()
            .find(|(type_name, _)| type_name == name)
            .map(|(_, fields)| fields.as_slice())
    }

    /// The exact bytes passed to [`Wallet::sign_message`](super::Wallet::sign_message).
    pub fn encode(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(self).map_err(|e| Error::encoding(format!("encoding typed data: {e}")))
    }
}

/// Free-function form of [`TypedData::assemble`].
pub fn assemble_typed_data(
    domain: Eip712Domain,
    primary_type: impl Into<String>,
    message: FieldMap,
    type_defs: TypeDefs,
) -> TypedData {
    TypedData::assemble(domain, primary_type, message, type_defs)
}

struct TypesMap<'a>(&'a [(String, Vec<SignatureField>)]);

impl Serialize for TypesMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, fields) in self.0 {
            map.serialize_entry(name, fields)?;
        }
        map.end()
    }
}

impl Serialize for TypedData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("domain", &self.domain)?;
        map.serialize_entry("primaryType", &self.primary_type)?;
        map.serialize_entry("types", &TypesMap(&self.types))?;
        map.serialize_entry("message", &self.message)?;
        map.end()
    }
}
