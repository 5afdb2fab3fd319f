//! Sign an order and a USD transfer with a local key, then verify both.
//!
//! Run with:
//! ```text
//! WALLET_PRIVATE_KEY=0x... HL_NETWORK=testnet cargo run --example sign_order
//! ```

use std::collections::HashMap;

use anyhow::Context;
use auth::LocalWallet;
use hl_core::decimal::WireConverter;
use hl_core::signing::{
    batch_orders_to_wire_with, create_usd_transfer_action, l1_typed_data,
    order_wires_to_order_action, sign_order_action, sign_usd_transfer_action,
    user_signed_typed_data, verify_signature, with_type_tag, UserSignedKind,
};
use hl_core::types::{timestamp_ms, Cloid, Grouping, OrderRequest, Tif};
use hl_core::SigningConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sign_order=info,hl_core=debug,auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Hyperliquid Signing Demo ===\n");

    // Step 1: Load configuration and wallet
    println!("1. Loading configuration and wallet...");
    let config = SigningConfig::from_env().context("loading signing configuration")?;
    let wallet = LocalWallet::from_env()?;
    println!("   Network: {}", config.network);
    println!("   Address: {}", wallet.address_string());

    // Step 2: Shape and sign an order
    println!("\n2. Signing a limit order...");
    let assets: HashMap<String, u32> = [("BTC".to_string(), 0), ("ETH".to_string(), 1)].into();
    let order = OrderRequest::limit("ETH", true, 0.01, 1500.0, Tif::Alo).with_cloid(Cloid::random());
    let converter = WireConverter::from_config(&config);
    let wires = batch_orders_to_wire_with(&converter, &[order], &assets)?;
    let action = order_wires_to_order_action(wires, Grouping::Na, None)?;
    let nonce = timestamp_ms();

    let signature = sign_order_action(&wallet, &action, config.vault(), nonce, config.network)?;
    let signed_bytes = l1_typed_data(&action, config.vault(), nonce, config.network)?.encode()?;
    let valid = verify_signature(&wallet.address_string(), &signed_bytes, &signature)?;
    info!(nonce, valid, "Order signed");

    let request = serde_json::json!({
        "action": action,
        "nonce": nonce,
        "signature": signature,
        "vaultAddress": config.vault(),
    });
    println!("   Request body:\n{}", serde_json::to_string_pretty(&request)?);

    // Step 3: Sign a USD transfer to ourselves
    println!("\n3. Signing a USD transfer...");
    let transfer = create_usd_transfer_action(&wallet.address_string(), "1", timestamp_ms())?;
    let signature = sign_usd_transfer_action(&wallet, &transfer, config.network)?;

    let kind = UserSignedKind::UsdSend;
    let signed_bytes =
        user_signed_typed_data(&transfer, &kind.sign_types(), kind.primary_type(), config.network)?
            .encode()?;
    let valid = verify_signature(&wallet.address_string(), &signed_bytes, &signature)?;
    info!(valid, "Transfer signed");

    let request = serde_json::json!({
        "action": with_type_tag("usdSend", &transfer),
        "signature": signature,
    });
    println!("   Request body:\n{}", serde_json::to_string_pretty(&request)?);

    println!("\n=== Done ===");
    Ok(())
}
