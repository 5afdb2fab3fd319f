//! Signing configuration.

use std::env;
use std::path::Path;

use serde::Deserialize;

use crate::decimal::{CACHE_MAX_ABS, DEFAULT_CACHE_CAPACITY};
use crate::signing::{normalize_address, Network};
use crate::{Error, Result};

/// Settings shared by every signing call of a process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    pub network: Network,
    /// Sub-account to act for; `None` signs for the wallet itself.
    pub vault_address: Option<String>,
    pub wire_cache_capacity: usize,
    pub wire_cache_max_abs: f64,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            vault_address: None,
            wire_cache_capacity: DEFAULT_CACHE_CAPACITY,
            wire_cache_max_abs: CACHE_MAX_ABS,
        }
    }
}

impl SigningConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `HL_NETWORK`, `HL_VAULT_ADDRESS`, `HL_WIRE_CACHE_CAPACITY` and
    /// `HL_WIRE_CACHE_MAX_ABS`, after loading a `.env` file if present.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    #[allow(clippy::result_large_err)]
    fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network = match var("HL_NETWORK") {
            Some(value) => value.parse()?,
            None => Network::Mainnet,
        };

        Self {
            network,
            vault_address: var("HL_VAULT_ADDRESS"),
            wire_cache_capacity: parse_var(&var, "HL_WIRE_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY)?,
            wire_cache_max_abs: parse_var(&var, "HL_WIRE_CACHE_MAX_ABS", CACHE_MAX_ABS)?,
        }
        .validated()
    }

    /// Load an optional TOML/YAML/JSON file, overridden by `HL_*` variables.
    #[allow(clippy::result_large_err)]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("HL").try_parsing(true))
            .build()?;

        settings.try_deserialize::<Self>()?.validated()
    }

    /// Vault address as it appears in signed payloads.
    pub fn vault(&self) -> Option<&str> {
        self.vault_address.as_deref()
    }

    fn validated(mut self) -> Result<Self> {
        self.vault_address = match self.vault_address.take().filter(|v| !v.is_empty()) {
            Some(vault) => Some(normalize_address("vaultAddress", &vault)?),
            None => None,
        };
        if self.wire_cache_max_abs.is_nan() || self.wire_cache_max_abs <= 0.0 {
            return Err(Error::Config {
                message: format!(
                    "wire_cache_max_abs must be positive, got {}",
                    self.wire_cache_max_abs
                ),
            });
        }
        Ok(self)
    }
}

#[allow(clippy::result_large_err)]
fn parse_var<F, T>(var: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match var(name) {
        Some(value) => value.parse().map_err(|_| Error::Config {
            message: format!("{name} is not a number: {value}"),
        }),
        None => Ok(default),
    }
}
