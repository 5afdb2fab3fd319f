//! Order, modify and cancel requests as callers build them.
//!
//! Requests carry plain floats and coin names. [`crate::signing::order_types`]
//! validates them and converts them to the wire shapes that get hashed.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Time in force of a limit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tif {
    /// Add liquidity only (post-only).
    Alo,
    /// Immediate or cancel.
    Ioc,
    /// Good till cancelled.
    Gtc,
}

/// Take-profit / stop-loss classification of a trigger order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tpsl {
    Tp,
    Sl,
}

/// How the orders of one action relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Grouping {
    #[default]
    #[serde(rename = "na")]
    Na,
    #[serde(rename = "normalTpsl")]
    NormalTpsl,
    #[serde(rename = "positionTpsl")]
    PositionTpsl,
}

/// Client order id. Passed through to the exchange untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cloid(String);

impl Cloid {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random 128-bit id as `0x` + 32 hex characters.
    pub fn random() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Cloid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderType {
    pub tif: Tif,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerOrderType {
    pub trigger_px: f64,
    pub is_market: bool,
    pub tpsl: Tpsl,
}

/// Exactly one of `limit` or `trigger` must be set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderType {
    pub limit: Option<LimitOrderType>,
    pub trigger: Option<TriggerOrderType>,
}

impl OrderType {
    pub fn limit(tif: Tif) -> Self {
        Self {
            limit: Some(LimitOrderType { tif }),
            trigger: None,
        }
    }

    pub fn trigger(trigger_px: f64, is_market: bool, tpsl: Tpsl) -> Self {
        Self {
            limit: None,
            trigger: Some(TriggerOrderType {
                trigger_px,
                is_market,
                tpsl,
            }),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match (&self.limit, &self.trigger) {
            (None, None) => Err(Error::InvalidOrderType),
            (Some(_), Some(_)) => Err(Error::AmbiguousOrderType),
            (None, Some(trigger)) if !is_positive(trigger.trigger_px) => {
                Err(Error::invalid_request("trigger price must be positive"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub coin: String,
    pub is_buy: bool,
    pub sz: f64,
    pub limit_px: f64,
    pub order_type: OrderType,
    pub reduce_only: bool,
    pub cloid: Option<Cloid>,
}

impl OrderRequest {
    pub fn limit(coin: impl Into<String>, is_buy: bool, sz: f64, limit_px: f64, tif: Tif) -> Self {
        Self {
            coin: coin.into(),
            is_buy,
            sz,
            limit_px,
            order_type: OrderType::limit(tif),
            reduce_only: false,
            cloid: None,
        }
    }

    pub fn trigger(
        coin: impl Into<String>,
        is_buy: bool,
        sz: f64,
        limit_px: f64,
        trigger_px: f64,
        is_market: bool,
        tpsl: Tpsl,
    ) -> Self {
        Self {
            coin: coin.into(),
            is_buy,
            sz,
            limit_px,
            order_type: OrderType::trigger(trigger_px, is_market, tpsl),
            reduce_only: false,
            cloid: None,
        }
    }

    pub fn reduce_only(mut self) -> Self {
        self.reduce_only = true;
        self
    }

    pub fn with_cloid(mut self, cloid: Cloid) -> Self {
        self.cloid = Some(cloid);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !is_positive(self.sz) {
            return Err(Error::invalid_request("size must be positive"));
        }
        if !is_positive(self.limit_px) {
            return Err(Error::invalid_request("limit price must be positive"));
        }
        self.order_type.validate()
    }
}

/// Replace a resting order, addressed by exchange id or client id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyRequest {
    pub oid: Option<u64>,
    pub cloid: Option<Cloid>,
    pub order: OrderRequest,
}

impl ModifyRequest {
    pub fn by_oid(oid: u64, order: OrderRequest) -> Self {
        Self {
            oid: Some(oid),
            cloid: None,
            order,
        }
    }

    pub fn by_cloid(cloid: Cloid, order: OrderRequest) -> Self {
        Self {
            oid: None,
            cloid: Some(cloid),
            order,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let has_oid = self.oid.is_some_and(|oid| oid > 0);
        let has_cloid = self.cloid.as_ref().is_some_and(|c| !c.is_empty());
        if !has_oid && !has_cloid {
            return Err(Error::invalid_request("either oid or cloid must be specified"));
        }
        self.order.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub coin: String,
    pub oid: u64,
}

impl CancelRequest {
    pub fn new(coin: impl Into<String>, oid: u64) -> Self {
        Self {
            coin: coin.into(),
            oid,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.coin.is_empty() {
            return Err(Error::invalid_request("coin must be specified"));
        }
        if self.oid == 0 {
            return Err(Error::invalid_request("order id must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelByCloidRequest {
    pub coin: String,
    pub cloid: Cloid,
}

impl CancelByCloidRequest {
    pub fn new(coin: impl Into<String>, cloid: Cloid) -> Self {
        Self {
            coin: coin.into(),
            cloid,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.coin.is_empty() {
            return Err(Error::invalid_request("coin must be specified"));
        }
        if self.cloid.is_empty() {
            return Err(Error::invalid_request("cloid must be specified"));
        }
        Ok(())
    }
}

fn is_positive(x: f64) -> bool {
    x > 0.0
}

/// Resolves coin names to exchange asset ids.
pub trait AssetLookup {
    fn asset_id(&self, coin: &str) -> Result<u32>;
}

impl AssetLookup for HashMap<String, u32> {
    fn asset_id(&self, coin: &str) -> Result<u32> {
        self.get(coin).copied().ok_or_else(|| Error::Lookup {
            coin: coin.to_string(),
        })
    }
}

/// Current time in milliseconds, the usual nonce source.
pub fn timestamp_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_order_validates() {
        let order = OrderRequest::limit("ETH", true, 0.1, 1800.0, Tif::Gtc);
        assert!(order.validate().is_ok());
        assert!(!order.reduce_only);
    }

    #[test]
    fn test_order_rejects_non_positive_amounts() {
        let zero_size = OrderRequest::limit("ETH", true, 0.0, 1800.0, Tif::Gtc);
        assert!(matches!(zero_size.validate(), Err(Error::InvalidRequest { .. })));

        let negative_px = OrderRequest::limit("ETH", true, 1.0, -1.0, Tif::Gtc);
        assert!(matches!(negative_px.validate(), Err(Error::InvalidRequest { .. })));

        let nan_size = OrderRequest::limit("ETH", true, f64::NAN, 1.0, Tif::Gtc);
        assert!(nan_size.validate().is_err());
    }

    #[test]
    fn test_order_type_needs_exactly_one_variant() {
        let mut order = OrderRequest::limit("BTC", false, 1.0, 30000.0, Tif::Ioc);
        order.order_type = OrderType::default();
        assert!(matches!(order.validate(), Err(Error::InvalidOrderType)));

        order.order_type = OrderType {
            limit: Some(LimitOrderType { tif: Tif::Alo }),
            trigger: Some(TriggerOrderType {
                trigger_px: 29000.0,
                is_market: true,
                tpsl: Tpsl::Sl,
            }),
        };
        assert!(matches!(order.validate(), Err(Error::AmbiguousOrderType)));
    }

    #[test]
    fn test_trigger_price_must_be_positive() {
        let order = OrderRequest::trigger("BTC", false, 1.0, 30000.0, 0.0, true, Tpsl::Tp);
        assert!(matches!(order.validate(), Err(Error::InvalidRequest { .. })));
    }

    #[test]
    fn test_modify_needs_target() {
        let order = OrderRequest::limit("ETH", true, 0.1, 1800.0, Tif::Gtc);
        let modify = ModifyRequest {
            oid: None,
            cloid: None,
            order: order.clone(),
        };
        assert!(modify.validate().is_err());

        assert!(ModifyRequest::by_oid(12, order.clone()).validate().is_ok());
        assert!(ModifyRequest::by_cloid(Cloid::random(), order).validate().is_ok());
    }

    #[test]
    fn test_cancel_validation() {
        assert!(CancelRequest::new("ETH", 5).validate().is_ok());
        assert!(CancelRequest::new("", 5).validate().is_err());
        assert!(CancelRequest::new("ETH", 0).validate().is_err());

        assert!(CancelByCloidRequest::new("ETH", Cloid::new("")).validate().is_err());
        assert!(CancelByCloidRequest::new("", Cloid::random()).validate().is_err());
    }

    #[test]
    fn test_random_cloid_format() {
        let cloid = Cloid::random();
        assert_eq!(cloid.as_str().len(), 34);
        assert!(cloid.as_str().starts_with("0x"));
        assert_ne!(cloid, Cloid::random());
    }

    #[test]
    fn test_asset_lookup() {
        let assets: HashMap<String, u32> = [("BTC".to_string(), 0), ("ETH".to_string(), 1)].into();
        assert_eq!(assets.asset_id("ETH").unwrap(), 1);
        assert!(matches!(
            assets.asset_id("DOGE"),
            Err(Error::Lookup { ref coin }) if coin == "DOGE"
        ));
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&Tif::Alo).unwrap(), "\"Alo\"");
        assert_eq!(serde_json::to_string(&Tpsl::Sl).unwrap(), "\"sl\"");
        assert_eq!(
            serde_json::to_string(&Grouping::PositionTpsl).unwrap(),
            "\"positionTpsl\""
        );
    }

    #[test]
    fn test_timestamp_ms_is_recent() {
        // 2020-09-13
        assert!(timestamp_ms() > 1_600_000_000_000);
    }
}
