//! Wallet key management.
//!
//! Concrete implementations of the [`hl_core::signing::Wallet`] capability.

pub mod wallet;

pub use wallet::LocalWallet;
