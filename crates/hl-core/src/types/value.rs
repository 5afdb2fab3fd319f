//! Loosely-typed action payloads with a fixed field order.
//!
//! The exchange hashes the msgpack encoding of an action, where map key order
//! is significant. [`FieldMap`] keeps insertion order so the encoding is the
//! same on every run.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// A single action field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(String),
    Seq(Vec<Value>),
    Map(FieldMap),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&FieldMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            // Non-negative integers go out in unsigned form, like every other
            // msgpack implementation the exchange is compatible with.
            Value::Int(i) if *i >= 0 => serializer.serialize_u64(*i as u64),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::UInt(u) => serializer.serialize_u64(*u),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Seq(items) => items.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<FieldMap> for Value {
    fn from(v: FieldMap) -> Self {
        Value::Map(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Seq(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Insertion-ordered map from field name to [`Value`].
///
/// Re-inserting an existing key replaces its value without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: Vec<(String, Value)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((key, value));
                None
            }
        }
    }

    /// Builder form of [`Self::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove a field, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order() {
        let map = FieldMap::new()
            .with("destination", "0xabc")
            .with("amount", "1.5")
            .with("time", 1700000000000u64);

        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["destination", "amount", "time"]);
    }

    #[test]
    fn test_reinsert_replaces_in_place() {
        let mut map = FieldMap::new().with("a", 1i64).with("b", 2i64);
        let previous = map.insert("a", 3i64);

        assert_eq!(previous, Some(Value::Int(1)));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_remove_keeps_remaining_order() {
        let mut map = FieldMap::new()
            .with("type", "order")
            .with("orders", Vec::<Value>::new())
            .with("grouping", "na");

        assert_eq!(map.remove("type"), Some(Value::from("order")));
        assert_eq!(map.remove("missing"), None);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["orders", "grouping"]);
    }

    #[test]
    fn test_msgpack_follows_insertion_order() {
        let ab = FieldMap::new().with("a", 1i64).with("b", 2i64);
        let ba = FieldMap::new().with("b", 2i64).with("a", 1i64);

        let ab_bytes = rmp_serde::to_vec_named(&ab).unwrap();
        let ba_bytes = rmp_serde::to_vec_named(&ba).unwrap();

        // fixmap(2) "a" 1 "b" 2
        assert_eq!(ab_bytes, vec![0x82, 0xa1, b'a', 0x01, 0xa1, b'b', 0x02]);
        assert_ne!(ab_bytes, ba_bytes);
    }

    #[test]
    fn test_msgpack_value_kinds() {
        let map = FieldMap::new()
            .with("t", true)
            .with("n", Value::Null)
            .with("neg", -1i64)
            .with("seq", vec![Value::from("x")]);

        let bytes = rmp_serde::to_vec_named(&map).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x84, 0xa1, b't', 0xc3, 0xa1, b'n', 0xc0, 0xa3, b'n', b'e', b'g', 0xff, 0xa3,
                b's', b'e', b'q', 0x91, 0xa1, b'x',
            ]
        );
    }

    #[test]
    fn test_json_serialization() {
        let map = FieldMap::new().with("amount", "1").with("toPerp", true);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["amount"], "1");
        assert_eq!(json["toPerp"], true);
    }

    #[test]
    fn test_option_into_value() {
        let none: Option<&str> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some("c")), Value::from("c"));
    }
}
