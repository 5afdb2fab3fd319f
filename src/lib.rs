//! hl-signer: Hyperliquid exchange action signing
//!
//! This is the root crate that provides benchmark and integration-test access
//! to the workspace members. For actual functionality, use the individual
//! crates directly:
//!
//! - `hl-core`: wire conversion, action hashing, typed data, signing, verification
//! - `auth`: private-key wallet implementing the signing capability

// Re-export for benchmarks
pub use auth;
pub use hl_core;
