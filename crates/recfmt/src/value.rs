//! Typed field values and the record map exchanged with callers.

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Value of one field, as read from or written to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// Character data.
    Text(String),
    /// Exact decimal number (unscaled integer plus scale).
    Decimal(Decimal),
}

impl Value {
    /// Whether the value is `Null` or an empty string.
    pub fn is_null_or_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            Value::Decimal(_) => false,
        }
    }

    /// Borrow the text, if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The decimal, if this is a `Decimal` value.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Text(s) => f.write_str(s),
            Value::Decimal(d) => write!(f, "{d}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Decimal(Decimal::from(n))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One record: field name to value, remembering insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataRecord {
    values: HashMap<String, Value>,
    order: Vec<String>,
}

impl DataRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the previous value.
    pub fn put(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        if !self.values.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.values.insert(name, value.into())
    }

    /// Builder-style [`put`](Self::put).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put(name, value);
        self
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Get a text field.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    /// Get a decimal field.
    pub fn get_decimal(&self, name: &str) -> Option<Decimal> {
        self.get(name).and_then(Value::as_decimal)
    }

    /// Whether the record holds a value (possibly `Null`) for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.order
            .iter()
            .filter_map(|name| self.values.get(name).map(|v| (name.as_str(), v)))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for DataRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for DataRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = DataRecord::new();
        for (k, v) in iter {
            record.put(k, v);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_put_keeps_order() {
        let record = DataRecord::new()
            .with("b", "2")
            .with("a", "1")
            .with("b", "3");
        let names: Vec<_> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(record.get_text("b"), Some("3"));
    }

    #[test]
    fn test_null_or_empty() {
        assert!(Value::Null.is_null_or_empty());
        assert!(Value::from("").is_null_or_empty());
        assert!(!Value::from(0i64).is_null_or_empty());
        assert_eq!(Value::from(None::<&str>), Value::Null);
    }

    #[test]
    fn test_serialize_record_as_json() {
        let record = DataRecord::new()
            .with("name", "abc")
            .with("amount", Decimal::from_str("-1.50").unwrap())
            .with("empty", Value::Null);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"name":"abc","amount":"-1.50","empty":null}"#);
    }
}
