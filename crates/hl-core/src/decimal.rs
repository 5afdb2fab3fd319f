//! Float to wire-decimal conversion.
//!
//! Prices, sizes and amounts travel to the exchange as decimal text. The text
//! is part of the signed payload, so a conversion either reproduces the float
//! within [`PRECISION_THRESHOLD`] at the requested number of places or fails
//! with [`Error::PrecisionLoss`]. Nothing is ever silently truncated.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{OnceLock, PoisonError, RwLock};

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::trace;

use crate::config::SigningConfig;
use crate::{Error, Result};

/// Maximum absolute difference tolerated between a float and its wire text.
pub const PRECISION_THRESHOLD: f64 = 1e-12;

/// Decimal places used for prices, sizes and hashing.
pub const DEFAULT_DECIMAL_PLACES: u32 = 8;

/// Decimal places used for USD-denominated amounts.
pub const USD_DECIMAL_PLACES: u32 = 6;

/// Hard cap on memoized conversions.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Only inputs strictly below this magnitude are memoized.
pub const CACHE_MAX_ABS: f64 = 1_000_000.0;

/// Largest precision accepted; `10^18` still fits in an i64.
pub const MAX_WIRE_PLACES: u32 = 18;

/// Bounded memo of successful float-to-text conversions.
///
/// Keyed by the exact bit pattern of the input together with the precision.
/// Only inputs with magnitude below `max_abs` are stored. Once `capacity`
/// entries exist further inserts are dropped; there is no eviction. Errors
/// are never stored.
#[derive(Debug)]
pub struct WireCache {
    entries: RwLock<HashMap<(u64, u32), String>>,
    capacity: usize,
    max_abs: f64,
}

impl WireCache {
    pub fn new(capacity: usize) -> Self {
        Self::with_limits(capacity, CACHE_MAX_ABS)
    }

    pub fn with_limits(capacity: usize, max_abs: f64) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(capacity.min(100))),
            capacity,
            max_abs,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, x: f64, places: u32) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(x.to_bits(), places))
            .cloned()
    }

    fn insert(&self, x: f64, places: u32, text: &str) {
        if x.abs() >= self.max_abs {
            return;
        }

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.capacity {
            trace!(capacity = self.capacity, "Wire cache full, skipping insert");
            return;
        }
        entries.insert((x.to_bits(), places), text.to_string());
    }
}

impl Default for WireCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

/// Converts floats to the exchange's decimal wire text.
///
/// Owns its [`WireCache`]; tests construct fresh instances, production code
/// normally goes through [`global`].
#[derive(Debug, Default)]
pub struct WireConverter {
    cache: WireCache,
}

impl WireConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_cache(WireCache::new(capacity))
    }

    pub fn with_cache(cache: WireCache) -> Self {
        Self { cache }
    }

    pub fn from_config(config: &SigningConfig) -> Self {
        Self::with_cache(WireCache::with_limits(
            config.wire_cache_capacity,
            config.wire_cache_max_abs,
        ))
    }

    pub fn cache(&self) -> &WireCache {
        &self.cache
    }

    /// Round `x` to `places` digits and return the normalized decimal text.
    ///
    /// Fails with [`Error::PrecisionLoss`] when the rounded value differs from
    /// `x` by at least [`PRECISION_THRESHOLD`] or `x` is not finite.
    pub fn to_wire_string(&self, x: f64, places: u32) -> Result<String> {
        if let Some(hit) = self.cache.get(x, places) {
            trace!(value = x, places, "Wire cache hit");
            return Ok(hit);
        }

        let text = format_wire(x, places)?;
        self.cache.insert(x, places, &text);
        Ok(text)
    }

    /// [`Self::to_wire_string`] at [`DEFAULT_DECIMAL_PLACES`].
    pub fn float_to_wire(&self, x: f64) -> Result<String> {
        self.to_wire_string(x, DEFAULT_DECIMAL_PLACES)
    }

    /// [`Self::to_wire_string`] at [`USD_DECIMAL_PLACES`].
    pub fn usd_to_wire(&self, x: f64) -> Result<String> {
        self.to_wire_string(x, USD_DECIMAL_PLACES)
    }
}

/// Process-wide converter used by the free functions and order shaping.
pub fn global() -> &'static WireConverter {
    static CONVERTER: OnceLock<WireConverter> = OnceLock::new();
    CONVERTER.get_or_init(WireConverter::new)
}

pub fn to_wire_string(x: f64, places: u32) -> Result<String> {
    global().to_wire_string(x, places)
}

pub fn float_to_wire(x: f64) -> Result<String> {
    global().float_to_wire(x)
}

pub fn usd_to_wire(x: f64) -> Result<String> {
    global().usd_to_wire(x)
}

fn format_wire(x: f64, places: u32) -> Result<String> {
    if !x.is_finite() {
        return Err(Error::precision_loss(format!("invalid float value: {x}")));
    }
    check_places(places)?;

    let Some(exact) = Decimal::from_f64_retain(x) else {
        return format_wide(x, places);
    };
    let rounded = exact.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);

    // Compare against the text the exchange will parse, not the decimal.
    let rounded_text = rounded.to_string();
    let rounded_float = f64::from_str(&rounded_text)
        .map_err(|e| Error::precision_loss(format!("parsing rounded float: {e}")))?;

    if (rounded_float - x).abs() >= PRECISION_THRESHOLD {
        return Err(Error::precision_loss(format!(
            "{x:.12} vs {rounded_float:.12} at {places} places"
        )));
    }

    let normalized = rounded.normalize();
    if normalized.is_zero() {
        return Ok("0".to_string());
    }
    Ok(normalized.to_string())
}

/// Magnitudes beyond the decimal range are integral floats; format their
/// exact expansion instead.
fn format_wide(x: f64, places: u32) -> Result<String> {
    let text = format!("{x:.prec$}", prec = places as usize);
    let parsed = f64::from_str(&text)
        .map_err(|e| Error::precision_loss(format!("parsing rounded float: {e}")))?;
    if (parsed - x).abs() >= PRECISION_THRESHOLD {
        return Err(Error::precision_loss(format!(
            "{x:e} does not round-trip at {places} places"
        )));
    }

    let trimmed = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text.as_str()
    };
    Ok(trimmed.to_string())
}

fn check_places(places: u32) -> Result<()> {
    if places > MAX_WIRE_PLACES {
        return Err(Error::invalid_request(format!(
            "{places} decimal places exceeds the maximum of {MAX_WIRE_PLACES}"
        )));
    }
    Ok(())
}

/// Scale `x` by `10^places` and round half away from zero into an i64.
pub fn to_wire_int(x: f64, places: u32) -> Result<i64> {
    if !x.is_finite() {
        return Err(Error::precision_loss(format!("invalid float value: {x}")));
    }
    check_places(places)?;

    let rounded = (x * 10f64.powi(places as i32)).round();
    checked_i64(rounded)
}

/// Exact variant of [`to_wire_int`]: the scaled value must already be within
/// `1e-3` of an integer.
pub fn float_to_int(x: f64, places: u32) -> Result<i64> {
    if !x.is_finite() {
        return Err(Error::precision_loss(format!("invalid float value: {x}")));
    }
    check_places(places)?;

    let with_decimals = x * 10f64.powi(places as i32);
    let rounded = with_decimals.round();
    if (rounded - with_decimals).abs() >= 1e-3 {
        return Err(Error::precision_loss(format!(
            "{x} would lose precision at {places} decimal places"
        )));
    }
    checked_i64(rounded)
}

/// Integer form of `x` at 8 places, for hash-stable keys.
pub fn float_to_int_for_hashing(x: f64) -> Result<i64> {
    float_to_int(x, DEFAULT_DECIMAL_PLACES)
}

/// Integer form of a USD amount at 6 places.
pub fn float_to_usd_int(x: f64) -> Result<i64> {
    float_to_int(x, USD_DECIMAL_PLACES)
}

fn checked_i64(rounded: f64) -> Result<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return Err(Error::Overflow { value: rounded });
    }
    Ok(rounded as i64)
}

/// Convert a decimal back to a float, failing if the float does not
/// reproduce the decimal within [`PRECISION_THRESHOLD`].
pub fn decimal_to_float(d: &Decimal) -> Result<f64> {
    let f = f64::from_str(&d.to_string())
        .map_err(|e| Error::precision_loss(format!("decimal {d} is not a float: {e}")))?;

    let back = Decimal::from_f64_retain(f)
        .ok_or_else(|| Error::precision_loss(format!("{f} is outside the decimal range")))?;
    if (back - *d).abs() > Decimal::new(1, 12) {
        return Err(Error::precision_loss(format!(
            "decimal {d} cannot be exactly represented as f64"
        )));
    }
    Ok(f)
}

/// Parse decimal text into a float.
pub fn safe_float(s: &str) -> Result<f64> {
    if s.is_empty() {
        return Err(Error::invalid_request("empty string cannot be converted to f64"));
    }
    f64::from_str(s).map_err(|e| Error::invalid_request(format!("parsing float {s:?}: {e}")))
}

/// Round for display only. Never use the result in a signed payload.
pub fn round_float(x: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    (x * scale).round() / scale
}
