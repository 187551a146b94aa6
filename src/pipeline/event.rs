// src/pipeline/event.rs
//! Event record and payload types

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::value::RawValue;
use std::collections::HashMap;

/// A queued analytics event
///
/// Immutable once created. The payload is rendered to JSON at enqueue time
/// and embedded verbatim when the batch is built.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event name (e.g. "level_start")
    pub event_type: String,

    /// Pre-serialized JSON object
    pub payload: Box<RawValue>,

    /// Seconds since epoch, assigned at enqueue
    pub timestamp: i64,

    /// Player identifier valid at enqueue
    pub player_id: String,
}

impl Event {
    pub fn new(
        event_type: impl Into<String>,
        payload: Box<RawValue>,
        timestamp: i64,
        player_id: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            timestamp,
            player_id: player_id.into(),
        }
    }
}

/// Scalar payload value
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Serialize for PayloadValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PayloadValue::Null => serializer.serialize_unit(),
            PayloadValue::Bool(b) => serializer.serialize_bool(*b),
            PayloadValue::Int(i) => serializer.serialize_i64(*i),
            // JSON has no NaN/Infinity literal
            PayloadValue::Float(f) if !f.is_finite() => serializer.serialize_unit(),
            PayloadValue::Float(f) => serializer.serialize_f64(*f),
            PayloadValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(v: &str) -> Self {
        PayloadValue::Text(v.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(v: String) -> Self {
        PayloadValue::Text(v)
    }
}

impl From<bool> for PayloadValue {
    fn from(v: bool) -> Self {
        PayloadValue::Bool(v)
    }
}

impl From<i32> for PayloadValue {
    fn from(v: i32) -> Self {
        PayloadValue::Int(i64::from(v))
    }
}

impl From<u32> for PayloadValue {
    fn from(v: u32) -> Self {
        PayloadValue::Int(i64::from(v))
    }
}

impl From<i64> for PayloadValue {
    fn from(v: i64) -> Self {
        PayloadValue::Int(v)
    }
}

impl From<f32> for PayloadValue {
    fn from(v: f32) -> Self {
        // Round-trip through the shortest f32 text so 0.1f32 stays 0.1
        PayloadValue::Float(v.to_string().parse().unwrap_or(f64::from(v)))
    }
}

impl From<f64> for PayloadValue {
    fn from(v: f64) -> Self {
        PayloadValue::Float(v)
    }
}

impl<T: Into<PayloadValue>> From<Option<T>> for PayloadValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(PayloadValue::Null)
    }
}

/// Ordered key/value payload
///
/// Keys keep insertion order; inserting an existing key replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    entries: Vec<(String, PayloadValue)>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PayloadValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<K, V> FromIterator<(K, V)> for Payload
where
    K: Into<String>,
    V: Into<PayloadValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Payload::new();
        for (k, v) in iter {
            payload.insert(k, v);
        }
        payload
    }
}

impl<V: Into<PayloadValue>> From<HashMap<String, V>> for Payload {
    fn from(map: HashMap<String, V>) -> Self {
        map.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let mut payload = Payload::new().with("b", 1).with("a", 2);
        payload.insert("b", "replaced");

        let keys: Vec<&str> = payload.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(payload.get("b"), Some(&PayloadValue::Text("replaced".to_string())));
        assert_eq!(payload.len(), 2);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(PayloadValue::from(true), PayloadValue::Bool(true));
        assert_eq!(PayloadValue::from(7u32), PayloadValue::Int(7));
        assert_eq!(PayloadValue::from(0.1f32), PayloadValue::Float(0.1));
        assert_eq!(PayloadValue::from(None::<i64>), PayloadValue::Null);
        assert_eq!(PayloadValue::from(Some("x")), PayloadValue::Text("x".to_string()));
    }

    #[test]
    fn test_payload_serializes_as_object() {
        let payload = Payload::new()
            .with("level", "1-1")
            .with("score", 250)
            .with("perfect", false)
            .with("bonus", None::<i64>);

        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"level":"1-1","score":250,"perfect":false,"bonus":null}"#);
    }

    #[test]
    fn test_non_finite_float_is_null() {
        let payload = Payload::new().with("ratio", f64::NAN);
        assert_eq!(serde_json::to_string(&payload).unwrap(), r#"{"ratio":null}"#);
    }

    #[test]
    fn test_from_hashmap() {
        let mut map = HashMap::new();
        map.insert("k".to_string(), 3i64);
        let payload = Payload::from(map);
        assert_eq!(payload.get("k"), Some(&PayloadValue::Int(3)));
    }
}
