//! Error types for action signing.
//!
//! Every variant is terminal for the call that produced it: failures are
//! caused by caller input, so nothing in this crate retries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("conversion would cause precision loss: {message}")]
    PrecisionLoss { message: String },

    #[error("integer overflow converting {value} to i64")]
    Overflow { value: f64 },

    #[error("invalid ethereum address format for {field}: {value}")]
    InvalidAddress { field: String, value: String },

    #[error("invalid order type: neither limit nor trigger is specified")]
    InvalidOrderType,

    #[error("invalid order type: both limit and trigger are specified")]
    AmbiguousOrderType,

    #[error("hyperliquidChain missing from signature types")]
    InvalidSignatureChain,

    #[error("encoding error: {message}")]
    Encoding { message: String },

    #[error("signature decode error: {message}")]
    Decode { message: String },

    #[error("unknown asset: {coin}")]
    Lookup { coin: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("field {field} is not declared in the {primary_type} type list")]
    UnexpectedField { field: String, primary_type: String },

    #[error("Signing error: {message}")]
    Signing { message: String },

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    pub(crate) fn precision_loss(message: impl Into<String>) -> Self {
        Error::PrecisionLoss {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_address(field: impl Into<String>, value: impl Into<String>) -> Self {
        Error::InvalidAddress {
            field: field.into(),
            value: value.into(),
        }
    }

    pub(crate) fn encoding(message: impl Into<String>) -> Self {
        Error::Encoding {
            message: message.into(),
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Error::Decode {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest {
            message: message.into(),
        }
    }

    pub(crate) fn missing_field(field: impl Into<String>) -> Self {
        Error::MissingField {
            field: field.into(),
        }
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Error::encoding(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
