//! Hyperliquid Core Library
//!
//! Wire conversion, canonical action hashing and EIP-712 signing for
//! exchange actions. Key material stays behind the [`signing::Wallet`]
//! capability; nothing in this crate performs I/O.

pub mod config;
pub mod decimal;
pub mod error;
pub mod signing;
pub mod types;

pub use config::SigningConfig;
pub use error::{Error, Result};
