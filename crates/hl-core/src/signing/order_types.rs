//! Wire shapes for order, modify and cancel actions.
//!
//! These structs serialize their fields in declaration order, which is the
//! order the exchange hashes them in. Do not reorder fields.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::Network;
use super::hash::normalize_address;
use super::signer::{sign_l1_action, Signature, Wallet};
use crate::decimal::{self, WireConverter};
use crate::types::{
    AssetLookup, CancelByCloidRequest, CancelRequest, Grouping, LimitOrderType, ModifyRequest,
    OrderRequest, OrderType, Tpsl,
};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerOrderTypeWire {
    #[serde(rename = "triggerPx")]
    pub trigger_px: String,
    #[serde(rename = "isMarket")]
    pub is_market: bool,
    pub tpsl: Tpsl,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTypeWire {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub limit: Option<LimitOrderType>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub trigger: Option<TriggerOrderTypeWire>,
}

/// One order as hashed and submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWire {
    /// Asset id.
    pub a: u32,
    /// Buy side.
    pub b: bool,
    /// Limit price.
    pub p: String,
    /// Size.
    pub s: String,
    /// Reduce only.
    pub r: bool,
    /// Order type.
    pub t: OrderTypeWire,
    /// Client order id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub c: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub orders: Vec<OrderWire>,
    pub grouping: Grouping,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub builder: Option<String>,
}

impl OrderAction {
    pub fn new(orders: Vec<OrderWire>, grouping: Grouping) -> Self {
        Self {
            action_type: "order".to_string(),
            orders,
            grouping,
            builder: None,
        }
    }

    /// Attach a builder address, lower-cased.
    pub fn with_builder(mut self, builder: &str) -> Result<Self> {
        self.builder = Some(normalize_address("builder", builder)?);
        Ok(self)
    }
}

/// Target of a modify: exchange order id or client order id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderRef {
    Oid(u64),
    Cloid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyWire {
    pub oid: OrderRef,
    pub order: OrderWire,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchModifyAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub modifies: Vec<ModifyWire>,
}

impl BatchModifyAction {
    pub fn new(modifies: Vec<ModifyWire>) -> Self {
        Self {
            action_type: "batchModify".to_string(),
            modifies,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelWire {
    pub a: u32,
    pub o: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub cancels: Vec<CancelWire>,
}

impl CancelAction {
    pub fn new(cancels: Vec<CancelWire>) -> Self {
        Self {
            action_type: "cancel".to_string(),
            cancels,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelByCloidWire {
    pub asset: u32,
    pub cloid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelByCloidAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub cancels: Vec<CancelByCloidWire>,
}

impl CancelByCloidAction {
    pub fn new(cancels: Vec<CancelByCloidWire>) -> Self {
        Self {
            action_type: "cancelByCloid".to_string(),
            cancels,
        }
    }
}

pub fn order_type_to_wire(order_type: &OrderType) -> Result<OrderTypeWire> {
    order_type_to_wire_with(decimal::global(), order_type)
}

/// [`order_type_to_wire`] through a caller-owned converter.
pub fn order_type_to_wire_with(
    converter: &WireConverter,
    order_type: &OrderType,
) -> Result<OrderTypeWire> {
    match (&order_type.limit, &order_type.trigger) {
        (Some(limit), None) => Ok(OrderTypeWire {
            limit: Some(*limit),
            trigger: None,
        }),
        (None, Some(trigger)) => Ok(OrderTypeWire {
            limit: None,
            trigger: Some(TriggerOrderTypeWire {
                trigger_px: converter.float_to_wire(trigger.trigger_px)?,
                is_market: trigger.is_market,
                tpsl: trigger.tpsl,
            }),
        }),
        (None, None) => Err(Error::InvalidOrderType),
        (Some(_), Some(_)) => Err(Error::AmbiguousOrderType),
    }
}

pub fn order_request_to_wire(order: &OrderRequest, asset: u32) -> Result<OrderWire> {
    order_request_to_wire_with(decimal::global(), order, asset)
}

/// [`order_request_to_wire`] through a caller-owned converter.
pub fn order_request_to_wire_with(
    converter: &WireConverter,
    order: &OrderRequest,
    asset: u32,
) -> Result<OrderWire> {
    order.validate()?;

    Ok(OrderWire {
        a: asset,
        b: order.is_buy,
        p: converter.float_to_wire(order.limit_px)?,
        s: converter.float_to_wire(order.sz)?,
        r: order.reduce_only,
        t: order_type_to_wire_with(converter, &order.order_type)?,
        c: order.cloid.as_ref().map(|c| c.as_str().to_string()),
    })
}

/// Convert a batch of requests, resolving each coin through `assets`.
pub fn batch_orders_to_wire<L>(orders: &[OrderRequest], assets: &L) -> Result<Vec<OrderWire>>
where
    L: AssetLookup + ?Sized,
{
    batch_orders_to_wire_with(decimal::global(), orders, assets)
}

/// [`batch_orders_to_wire`] through a caller-owned converter, e.g. one built
/// with [`WireConverter::from_config`].
pub fn batch_orders_to_wire_with<L>(
    converter: &WireConverter,
    orders: &[OrderRequest],
    assets: &L,
) -> Result<Vec<OrderWire>>
where
    L: AssetLookup + ?Sized,
{
    if orders.is_empty() {
        return Err(Error::invalid_request("no orders provided"));
    }

    orders
        .iter()
        .map(|order| {
            let asset = assets.asset_id(&order.coin)?;
            order_request_to_wire_with(converter, order, asset)
        })
        .collect()
}

pub fn order_wires_to_order_action(
    orders: Vec<OrderWire>,
    grouping: Grouping,
    builder: Option<&str>,
) -> Result<OrderAction> {
    let action = OrderAction::new(orders, grouping);
    match builder.filter(|b| !b.is_empty()) {
        Some(builder) => action.with_builder(builder),
        None => Ok(action),
    }
}

pub fn modify_request_to_wire<L>(request: &ModifyRequest, assets: &L) -> Result<ModifyWire>
where
    L: AssetLookup + ?Sized,
{
    modify_request_to_wire_with(decimal::global(), request, assets)
}

/// [`modify_request_to_wire`] through a caller-owned converter.
pub fn modify_request_to_wire_with<L>(
    converter: &WireConverter,
    request: &ModifyRequest,
    assets: &L,
) -> Result<ModifyWire>
where
    L: AssetLookup + ?Sized,
{
    request.validate()?;

    let asset = assets.asset_id(&request.order.coin)?;
    let order = order_request_to_wire_with(converter, &request.order, asset)?;
    let oid = match (request.oid, &request.cloid) {
        (Some(oid), _) if oid > 0 => OrderRef::Oid(oid),
        (_, Some(cloid)) => OrderRef::Cloid(cloid.as_str().to_string()),
        _ => return Err(Error::invalid_request("either oid or cloid must be specified")),
    };

    Ok(ModifyWire { oid, order })
}

pub fn cancel_request_to_wire<L>(request: &CancelRequest, assets: &L) -> Result<CancelWire>
where
    L: AssetLookup + ?Sized,
{
    request.validate()?;
    Ok(CancelWire {
        a: assets.asset_id(&request.coin)?,
        o: request.oid,
    })
}

pub fn cancel_by_cloid_request_to_wire<L>(
    request: &CancelByCloidRequest,
    assets: &L,
) -> Result<CancelByCloidWire>
where
    L: AssetLookup + ?Sized,
{
    request.validate()?;
    Ok(CancelByCloidWire {
        asset: assets.asset_id(&request.coin)?,
        cloid: request.cloid.as_str().to_string(),
    })
}

pub fn sign_order_action<W>(
    wallet: &W,
    action: &OrderAction,
    vault_address: Option<&str>,
    nonce: u64,
    network: Network,
) -> Result<Signature>
where
    W: Wallet + ?Sized,
{
    debug!(orders = action.orders.len(), grouping = ?action.grouping, "Signing order action");
    sign_l1_action(wallet, action, vault_address, nonce, network)
}

pub fn sign_batch_order_action<W>(
    wallet: &W,
    orders: Vec<OrderWire>,
    grouping: Grouping,
    builder: Option<&str>,
    vault_address: Option<&str>,
    nonce: u64,
    network: Network,
) -> Result<Signature>
where
    W: Wallet + ?Sized,
{
    let action = order_wires_to_order_action(orders, grouping, builder)?;
    sign_order_action(wallet, &action, vault_address, nonce, network)
}

pub fn sign_modify_action<W>(
    wallet: &W,
    modifies: Vec<ModifyWire>,
    vault_address: Option<&str>,
    nonce: u64,
    network: Network,
) -> Result<Signature>
where
    W: Wallet + ?Sized,
{
    if modifies.is_empty() {
        return Err(Error::invalid_request("no modifies provided"));
    }
    sign_l1_action(
        wallet,
        &BatchModifyAction::new(modifies),
        vault_address,
        nonce,
        network,
    )
}

pub fn sign_cancel_action<W>(
    wallet: &W,
    cancels: Vec<CancelWire>,
    vault_address: Option<&str>,
    nonce: u64,
    network: Network,
) -> Result<Signature>
where
    W: Wallet + ?Sized,
{
    if cancels.is_empty() {
        return Err(Error::invalid_request("no cancels provided"));
    }
    sign_l1_action(wallet, &CancelAction::new(cancels), vault_address, nonce, network)
}

pub fn sign_cancel_by_cloid_action<W>(
    wallet: &W,
    cancels: Vec<CancelByCloidWire>,
    vault_address: Option<&str>,
    nonce: u64,
    network: Network,
) -> Result<Signature>
where
    W: Wallet + ?Sized,
{
    if cancels.is_empty() {
        return Err(Error::invalid_request("no cancels provided"));
    }
    sign_l1_action(
        wallet,
        &CancelByCloidAction::new(cancels),
        vault_address,
        nonce,
        network,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::hash::action_hash;
    use crate::signing::signer::{l1_typed_data, MockWallet};
    use crate::types::{Cloid, FieldMap, Tif, Value};
    use std::collections::HashMap;

    fn assets() -> HashMap<String, u32> {
        [("BTC".to_string(), 0), ("ETH".to_string(), 4)].into()
    }

    fn dummy_signature() -> Signature {
        Signature::from_rsv(&[5u8; 32], &[6u8; 32], 27)
    }

    #[test]
    fn test_limit_order_wire_json() {
        let order = OrderRequest::limit("ETH", true, 0.1, 1800.0, Tif::Gtc);
        let wire = order_request_to_wire(&order, 4).unwrap();

        assert_eq!(
            serde_json::to_string(&wire).unwrap(),
            r#"{"a":4,"b":true,"p":"1800","s":"0.1","r":false,"t":{"limit":{"tif":"Gtc"}}}"#
        );
    }

    #[test]
    fn test_trigger_order_wire_json() {
        let order = OrderRequest::trigger("BTC", false, 0.5, 29000.0, 29500.5, true, Tpsl::Sl)
            .reduce_only()
            .with_cloid(Cloid::new("0x00000000000000000000000000000001"));
        let wire = order_request_to_wire(&order, 0).unwrap();

        assert_eq!(
            serde_json::to_string(&wire).unwrap(),
            r#"{"a":0,"b":false,"p":"29000","s":"0.5","r":true,"t":{"trigger":{"triggerPx":"29500.5","isMarket":true,"tpsl":"sl"}},"c":"0x00000000000000000000000000000001"}"#
        );
    }

    #[test]
    fn test_order_wire_rejects_unrepresentable_price() {
        let order = OrderRequest::limit("ETH", true, 0.1, 1800.123456789, Tif::Gtc);
        assert!(matches!(
            order_request_to_wire(&order, 4),
            Err(Error::PrecisionLoss { .. })
        ));
    }

    #[test]
    fn test_order_action_hash_matches_field_map() {
        let wire = order_request_to_wire(&OrderRequest::limit("BTC", true, 1.0, 100.0, Tif::Alo), 0)
            .unwrap();
        let action = OrderAction::new(vec![wire], Grouping::Na);

        let as_map = FieldMap::new()
            .with("type", "order")
            .with(
                "orders",
                vec![Value::from(
                    FieldMap::new()
                        .with("a", 0u32)
                        .with("b", true)
                        .with("p", "100")
                        .with("s", "1")
                        .with("r", false)
                        .with(
                            "t",
                            FieldMap::new().with("limit", FieldMap::new().with("tif", "Alo")),
                        ),
                )],
            )
            .with("grouping", "na");

        assert_eq!(
            action_hash(&action, None, 77).unwrap(),
            action_hash(&as_map, None, 77).unwrap()
        );
    }

    #[test]
    fn test_batch_orders_to_wire() {
        let orders = vec![
            OrderRequest::limit("BTC", true, 0.01, 30000.0, Tif::Gtc),
            OrderRequest::limit("ETH", false, 1.5, 2000.0, Tif::Ioc),
        ];
        let wires = batch_orders_to_wire(&orders, &assets()).unwrap();
        assert_eq!(wires.len(), 2);
        assert_eq!(wires[1].a, 4);
        assert_eq!(wires[1].s, "1.5");

        assert!(matches!(
            batch_orders_to_wire(&[], &assets()),
            Err(Error::InvalidRequest { .. })
        ));

        let unknown = vec![OrderRequest::limit("DOGE", true, 1.0, 0.1, Tif::Gtc)];
        assert!(matches!(
            batch_orders_to_wire(&unknown, &assets()),
            Err(Error::Lookup { .. })
        ));
    }

    #[test]
    fn test_batch_uses_caller_converter() {
        let converter = WireConverter::with_cache(decimal::WireCache::with_limits(10, 50_000.0));
        let orders = vec![
            OrderRequest::limit("ETH", true, 0.25, 1800.5, Tif::Gtc),
            OrderRequest::limit("BTC", false, 0.01, 65000.0, Tif::Ioc),
        ];

        let wires = batch_orders_to_wire_with(&converter, &orders, &assets()).unwrap();
        assert_eq!(wires, batch_orders_to_wire(&orders, &assets()).unwrap());
        // 65000 is above the cache bound, the other three values are memoized.
        assert_eq!(converter.cache().len(), 3);

        let modify = ModifyRequest::by_oid(7, orders[0].clone());
        modify_request_to_wire_with(&converter, &modify, &assets()).unwrap();
        assert_eq!(converter.cache().len(), 3);
    }

    #[test]
    fn test_builder_is_lowercased_and_optional() {
        let action = order_wires_to_order_action(
            vec![],
            Grouping::NormalTpsl,
            Some("0xABCDEF0000000000000000000000000000000001"),
        )
        .unwrap();
        assert_eq!(
            action.builder.as_deref(),
            Some("0xabcdef0000000000000000000000000000000001")
        );

        let plain = order_wires_to_order_action(vec![], Grouping::Na, None).unwrap();
        let json = serde_json::to_string(&plain).unwrap();
        assert_eq!(json, r#"{"type":"order","orders":[],"grouping":"na"}"#);

        assert!(order_wires_to_order_action(vec![], Grouping::Na, Some("0x12")).is_err());
    }

    #[test]
    fn test_modify_by_oid_and_cloid() {
        let order = OrderRequest::limit("ETH", true, 0.1, 1800.0, Tif::Gtc);

        let by_oid = modify_request_to_wire(&ModifyRequest::by_oid(99, order.clone()), &assets())
            .unwrap();
        assert_eq!(by_oid.oid, OrderRef::Oid(99));

        let cloid = Cloid::new("0x0000000000000000000000000000abcd");
        let by_cloid =
            modify_request_to_wire(&ModifyRequest::by_cloid(cloid, order), &assets()).unwrap();
        let json = serde_json::to_value(&by_cloid).unwrap();
        assert_eq!(json["oid"], "0x0000000000000000000000000000abcd");
    }

    #[test]
    fn test_cancel_wires() {
        let cancel = cancel_request_to_wire(&CancelRequest::new("ETH", 12), &assets()).unwrap();
        assert_eq!(cancel, CancelWire { a: 4, o: 12 });

        let by_cloid = cancel_by_cloid_request_to_wire(
            &CancelByCloidRequest::new("BTC", Cloid::new("0x01")),
            &assets(),
        )
        .unwrap();
        assert_eq!(
            serde_json::to_string(&CancelByCloidAction::new(vec![by_cloid])).unwrap(),
            r#"{"type":"cancelByCloid","cancels":[{"asset":0,"cloid":"0x01"}]}"#
        );
    }

    #[test]
    fn test_sign_order_action_runs_l1_flow() {
        let wire = order_request_to_wire(&OrderRequest::limit("BTC", true, 1.0, 100.0, Tif::Gtc), 0)
            .unwrap();
        let action = OrderAction::new(vec![wire.clone()], Grouping::Na);
        let expected = l1_typed_data(&action, None, 5, Network::Mainnet)
            .unwrap()
            .encode()
            .unwrap();

        let mut wallet = MockWallet::new();
        wallet
            .expect_sign_message()
            .withf(move |m| m.to_vec() == expected)
            .times(1)
            .returning(|_| Ok(dummy_signature()));

        let sig = sign_batch_order_action(
            &wallet,
            vec![wire],
            Grouping::Na,
            None,
            None,
            5,
            Network::Mainnet,
        )
        .unwrap();
        assert_eq!(sig, dummy_signature());
    }

    #[test]
    fn test_empty_batches_never_sign() {
        let mut wallet = MockWallet::new();
        wallet.expect_sign_message().times(0);

        assert!(sign_cancel_action(&wallet, vec![], None, 1, Network::Mainnet).is_err());
        assert!(sign_cancel_by_cloid_action(&wallet, vec![], None, 1, Network::Mainnet).is_err());
        assert!(sign_modify_action(&wallet, vec![], None, 1, Network::Mainnet).is_err());
    }
}
