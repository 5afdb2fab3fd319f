//! In-memory private-key wallet.
//!
//! Loads a secp256k1 key from the environment or a hex string and signs
//! typed-data envelopes with EIP-191 personal sign.

use std::str::FromStr;

use alloy_primitives::Address;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use hl_core::signing::{Signature, Wallet};
use tracing::trace;

/// A wallet holding its private key in memory.
#[derive(Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
    address: Address,
}

impl LocalWallet {
    /// Load wallet from the `WALLET_PRIVATE_KEY` environment variable.
    ///
    /// The private key should be a 64-character hex string, optionally
    /// prefixed with "0x".
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable is not set or
    /// if the private key format is invalid.
    pub fn from_env() -> Result<Self> {
        let private_key = std::env::var("WALLET_PRIVATE_KEY")
            .context("WALLET_PRIVATE_KEY environment variable not set")?;

        Self::from_private_key(&private_key)
    }

    /// Create a wallet from a hex-encoded private key.
    pub fn from_private_key(key: &str) -> Result<Self> {
        let key_clean = key.trim().trim_start_matches("0x");

        let signer = PrivateKeySigner::from_str(key_clean)
            .context("Invalid private key format - expected 64 hex characters")?;
        let address = signer.address();

        Ok(Self { signer, address })
    }

    /// Fresh random key, for tests and throwaway agents.
    pub fn random() -> Self {
        let signer = PrivateKeySigner::random();
        let address = signer.address();
        Self { signer, address }
    }

    /// Lower-case `0x` address, the form used inside signed payloads.
    pub fn address_string(&self) -> String {
        hl_core::signing::address_to_hex(&self.address)
    }
}

impl Wallet for LocalWallet {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_message(&self, message: &[u8]) -> hl_core::Result<Signature> {
        let signature = self
            .signer
            .sign_message_sync(message)
            .map_err(|e| hl_core::Error::Signing {
                message: e.to_string(),
            })?;

        trace!(signer = %self.address, len = message.len(), "Signed message");
        Ok(Signature::from(signature))
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose the private key in debug output
        f.debug_struct("LocalWallet")
            .field("address", &self.address_string())
            .finish()
    }
}
