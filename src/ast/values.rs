use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A literal value carried by the query tree.
///
/// Values never participate in structural fingerprints beyond their kind tag:
/// two trees differing only in literal content share one cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// Signed 64-bit integer
    Int(i64),
    /// Unsigned 64-bit integer
    UInt(u64),
    /// Double-precision float
    Float(f64),
    /// Text
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// UUID value
    Uuid(Uuid),
    /// Timestamp with UTC offset
    Timestamp(DateTime<Utc>),
    /// Arbitrary-precision decimal
    Decimal(Decimal),
    /// Numeric vector (embedding-style payloads)
    Vector(Vec<f64>),
    /// JSON document
    Json(serde_json::Value),
    /// Array of values
    Array(Vec<Value>),
}

/// The kind tag of a [`Value`] or of a record field destination.
///
/// Used as the scratch-pool tier key, the converter dispatch tag and the
/// structural stand-in for literal content in fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    Text,
    Bytes,
    Uuid,
    Timestamp,
    Decimal,
    Vector,
    Json,
    Array,
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Uuid(_) => ValueKind::Uuid,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Vector(_) => ValueKind::Vector,
            Value::Json(_) => ValueKind::Json,
            Value::Array(_) => ValueKind::Array,
        }
    }

    /// Human-readable name of this value's kind, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self.kind() {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "i64",
            ValueKind::UInt => "u64",
            ValueKind::Float => "f64",
            ValueKind::Text => "text",
            ValueKind::Bytes => "bytes",
            ValueKind::Uuid => "uuid",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Decimal => "decimal",
            ValueKind::Vector => "vector",
            ValueKind::Json => "json",
            ValueKind::Array => "array",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::UInt(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Uuid(u) => write!(f, "'{}'", u),
            Value::Timestamp(t) => write!(f, "'{}'", t.to_rfc3339()),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Vector(v) => write!(f, "<vector[{}]>", v.len()),
            Value::Json(j) => write!(f, "{}", j),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(n as f64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
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

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<serde_json::Value> for Value {
    fn from(j: serde_json::Value) -> Self {
        Value::Json(j)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Vec<i64>> for Value {
    fn from(items: Vec<i64>) -> Self {
        Value::Array(items.into_iter().map(Value::Int).collect())
    }
}

impl From<Vec<f64>> for Value {
    fn from(items: Vec<f64>) -> Self {
        Value::Vector(items)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::Array(items.into_iter().map(Value::Text).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kinds() {
        assert_eq!(Value::from(5i64).kind(), ValueKind::Int);
        assert_eq!(Value::from(5u64).kind(), ValueKind::UInt);
        assert_eq!(Value::from("hi").kind(), ValueKind::Text);
        assert!(Value::from(None::<i64>).is_null());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Text("abc".into()).to_string(), "'abc'");
        assert_eq!(
            Value::Array(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "[1, 2]"
        );
    }
}
