//! Signing module for exchange actions.
//!
//! # Architecture
//!
//! ```text
//! OrderRequest ── order_types ──► OrderAction ─┐
//!                                              │
//! FieldMap (any L1 action) ────────────────────┤
//!                                              ▼
//!                          action_hash (msgpack ‖ nonce ‖ vault)
//!                                              │
//!                                              ▼
//!                          PhantomAgent ──► TypedData ("Agent", Exchange domain)
//!                                                          │
//! FieldMap (user-signed) ── UserSignedKind ──► TypedData ──┤
//!                                  (HyperliquidSignTransaction domain)
//!                                                          ▼
//!                                             Wallet::sign_message ──► Signature
//!                                                          │
//!                                                          ▼
//!                                                  verify_signature
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hl_core::signing::{create_usd_transfer_action, sign_usd_transfer_action, Network};
//!
//! let action = create_usd_transfer_action("0x5e9e...a13a", "10", timestamp_ms())?;
//! let signature = sign_usd_transfer_action(&wallet, &action, Network::Testnet)?;
//! ```

pub mod actions;
pub mod domain;
pub mod hash;
pub mod multisig;
pub mod order_types;
pub mod signer;
pub mod typed_data;
pub mod verify;

pub use actions::{
    create_agent_action, create_approve_builder_fee_action,
    create_convert_to_multi_sig_user_action, create_spot_transfer_action,
    create_usd_class_transfer_action, create_usd_transfer_action, create_withdraw_action,
    sign_agent_action, sign_approve_builder_fee_action, sign_convert_to_multi_sig_user_action,
    sign_spot_transfer_action, sign_usd_class_transfer_action, sign_usd_transfer_action,
    sign_user_action, sign_withdraw_action, with_type_tag, UserSignedKind,
};

pub use domain::{
    signature_fields, Eip712Domain, Network, SignatureField, EXCHANGE_CHAIN_ID,
    SIGNATURE_CHAIN_ID, SIGN_TRANSACTION_CHAIN_ID,
};

pub use hash::{action_hash, address_to_hex, normalize_address, parse_address, PhantomAgent};

pub use multisig::{
    add_multi_sig_fields, add_multi_sig_types, create_multi_sig_action, sign_multi_sig_action,
    sign_multi_sig_l1_action_payload, sign_multi_sig_user_signed_action_payload,
};

pub use order_types::{
    batch_orders_to_wire, batch_orders_to_wire_with, cancel_by_cloid_request_to_wire,
    cancel_request_to_wire, modify_request_to_wire, modify_request_to_wire_with,
    order_request_to_wire, order_request_to_wire_with, order_type_to_wire,
    order_type_to_wire_with,
    order_wires_to_order_action, sign_batch_order_action, sign_cancel_action,
    sign_cancel_by_cloid_action, sign_modify_action, sign_order_action, BatchModifyAction,
    CancelAction, CancelByCloidAction, CancelByCloidWire, CancelWire, ModifyWire, OrderAction,
    OrderRef, OrderTypeWire, OrderWire, TriggerOrderTypeWire,
};

pub use signer::{
    l1_typed_data, sign_l1_action, sign_typed_data, sign_user_signed_action,
    user_signed_typed_data, Signature, Wallet, ADDRESS_SHAPED_FIELDS,
};

#[cfg(test)]
pub use signer::MockWallet;

pub use typed_data::{assemble_typed_data, TypeDefs, TypedData};

pub use verify::{hash_message, recover_address, verify_signature};
