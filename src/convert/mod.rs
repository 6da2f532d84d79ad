//! Checked value conversions for row materialization.
//!
//! Every destination type a field setter can write implements [`FromValue`].
//! Identity conversions pass through; narrowing conversions check overflow
//! and sign explicitly and reject rather than truncate. Failures are typed
//! errors the scan propagates per column.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::ast::{Value, ValueKind};
use crate::error::ConvertError;

/// A typed destination a scanned [`Value`] can convert into.
pub trait FromValue: Sized + Send + 'static {
    /// The field kind recorded in metadata and used to tier scratch pools.
    const KIND: ValueKind;

    fn from_value(value: Value) -> Result<Self, ConvertError>;
}

/// Wrapper marking a composite field stored as a JSON document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Json<T>(pub T);

fn unsupported(value: &Value, to: &'static str) -> ConvertError {
    ConvertError::Unsupported {
        from: value.type_name(),
        to,
    }
}

fn parse_text<T: std::str::FromStr>(text: &str, to: &'static str) -> Result<T, ConvertError>
where
    T::Err: std::fmt::Display,
{
    text.trim().parse().map_err(|e: T::Err| ConvertError::Parse {
        text: text.to_string(),
        to,
        message: e.to_string(),
    })
}

fn int_from_value(value: Value, to: &'static str) -> Result<i64, ConvertError> {
    match value {
        Value::Int(n) => Ok(n),
        Value::UInt(n) => i64::try_from(n).map_err(|_| ConvertError::Overflow {
            value: n.to_string(),
            to,
        }),
        Value::Float(f) => {
            if f.fract() != 0.0 {
                return Err(ConvertError::PrecisionLoss {
                    value: f.to_string(),
                    to,
                });
            }
            if f < i64::MIN as f64 || f > i64::MAX as f64 {
                return Err(ConvertError::Overflow {
                    value: f.to_string(),
                    to,
                });
            }
            Ok(f as i64)
        }
        Value::Text(s) => parse_text(&s, to),
        Value::Decimal(d) => d.to_i64().ok_or_else(|| ConvertError::Overflow {
            value: d.to_string(),
            to,
        }),
        Value::Null => Err(ConvertError::UnexpectedNull { to }),
        other => Err(unsupported(&other, to)),
    }
}

fn uint_from_value(value: Value, to: &'static str) -> Result<u64, ConvertError> {
    match value {
        Value::UInt(n) => Ok(n),
        Value::Int(n) => u64::try_from(n).map_err(|_| ConvertError::SignLoss {
            value: n.to_string(),
            to,
        }),
        Value::Float(f) => {
            if f.fract() != 0.0 {
                return Err(ConvertError::PrecisionLoss {
                    value: f.to_string(),
                    to,
                });
            }
            if f < 0.0 {
                return Err(ConvertError::SignLoss {
                    value: f.to_string(),
                    to,
                });
            }
            if f > u64::MAX as f64 {
                return Err(ConvertError::Overflow {
                    value: f.to_string(),
                    to,
                });
            }
            Ok(f as u64)
        }
        Value::Text(s) => parse_text(&s, to),
        Value::Decimal(d) => d.to_u64().ok_or_else(|| ConvertError::SignLoss {
            value: d.to_string(),
            to,
        }),
        Value::Null => Err(ConvertError::UnexpectedNull { to }),
        other => Err(unsupported(&other, to)),
    }
}

macro_rules! narrow_int {
    ($ty:ty, $name:literal) => {
        impl FromValue for $ty {
            const KIND: ValueKind = ValueKind::Int;

            fn from_value(value: Value) -> Result<Self, ConvertError> {
                let wide = int_from_value(value, $name)?;
                <$ty>::try_from(wide).map_err(|_| ConvertError::Overflow {
                    value: wide.to_string(),
                    to: $name,
                })
            }
        }
    };
}

macro_rules! narrow_uint {
    ($ty:ty, $name:literal) => {
        impl FromValue for $ty {
            const KIND: ValueKind = ValueKind::UInt;

            fn from_value(value: Value) -> Result<Self, ConvertError> {
                let wide = uint_from_value(value, $name)?;
                <$ty>::try_from(wide).map_err(|_| ConvertError::Overflow {
                    value: wide.to_string(),
                    to: $name,
                })
            }
        }
    };
}

impl FromValue for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        int_from_value(value, "i64")
    }
}

narrow_int!(i32, "i32");
narrow_int!(i16, "i16");
narrow_int!(i8, "i8");

impl FromValue for u64 {
    const KIND: ValueKind = ValueKind::UInt;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        uint_from_value(value, "u64")
    }
}

narrow_uint!(u32, "u32");
narrow_uint!(u16, "u16");
narrow_uint!(u8, "u8");

impl FromValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(n) => Ok(n as f64),
            Value::UInt(n) => Ok(n as f64),
            Value::Text(s) => parse_text(&s, "f64"),
            Value::Decimal(d) => d.to_f64().ok_or_else(|| ConvertError::Overflow {
                value: d.to_string(),
                to: "f64",
            }),
            Value::Null => Err(ConvertError::UnexpectedNull { to: "f64" }),
            other => Err(unsupported(&other, "f64")),
        }
    }
}

impl FromValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        let wide = f64::from_value(value)?;
        let narrow = wide as f32;
        if wide.is_finite() && !narrow.is_finite() {
            return Err(ConvertError::Overflow {
                value: wide.to_string(),
                to: "f32",
            });
        }
        Ok(narrow)
    }
}

impl FromValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            Value::Int(n) => Err(ConvertError::Parse {
                text: n.to_string(),
                to: "bool",
                message: "expected 0 or 1".to_string(),
            }),
            Value::Text(s) => parse_text(&s, "bool"),
            Value::Null => Err(ConvertError::UnexpectedNull { to: "bool" }),
            other => Err(unsupported(&other, "bool")),
        }
    }
}

impl FromValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Int(n) => Ok(n.to_string()),
            Value::UInt(n) => Ok(n.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Uuid(u) => Ok(u.to_string()),
            Value::Timestamp(t) => Ok(t.to_rfc3339()),
            Value::Decimal(d) => Ok(d.to_string()),
            Value::Json(j) => Ok(j.to_string()),
            Value::Bytes(b) => String::from_utf8(b).map_err(|e| ConvertError::Parse {
                text: "<bytes>".to_string(),
                to: "String",
                message: e.to_string(),
            }),
            Value::Null => Err(ConvertError::UnexpectedNull { to: "String" }),
            other => Err(unsupported(&other, "String")),
        }
    }
}

impl FromValue for Vec<u8> {
    const KIND: ValueKind = ValueKind::Bytes;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            Value::Null => Err(ConvertError::UnexpectedNull { to: "Vec<u8>" }),
            other => Err(unsupported(&other, "Vec<u8>")),
        }
    }
}

impl FromValue for Uuid {
    const KIND: ValueKind = ValueKind::Uuid;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Uuid(u) => Ok(u),
            Value::Text(s) => Uuid::parse_str(s.trim()).map_err(|e| ConvertError::Parse {
                text: s,
                to: "Uuid",
                message: e.to_string(),
            }),
            Value::Bytes(b) => Uuid::from_slice(&b).map_err(|e| ConvertError::Parse {
                text: format!("<{} bytes>", b.len()),
                to: "Uuid",
                message: e.to_string(),
            }),
            Value::Null => Err(ConvertError::UnexpectedNull { to: "Uuid" }),
            other => Err(unsupported(&other, "Uuid")),
        }
    }
}

impl FromValue for DateTime<Utc> {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Timestamp(t) => Ok(t),
            Value::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| ConvertError::Parse {
                    text: s,
                    to: "DateTime<Utc>",
                    message: e.to_string(),
                }),
            // Integer timestamps convert as unix seconds.
            Value::Int(secs) => {
                DateTime::from_timestamp(secs, 0).ok_or_else(|| ConvertError::Overflow {
                    value: secs.to_string(),
                    to: "DateTime<Utc>",
                })
            }
            Value::Null => Err(ConvertError::UnexpectedNull {
                to: "DateTime<Utc>",
            }),
            other => Err(unsupported(&other, "DateTime<Utc>")),
        }
    }
}

impl FromValue for Decimal {
    const KIND: ValueKind = ValueKind::Decimal;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Decimal(d) => Ok(d),
            Value::Int(n) => Ok(Decimal::from(n)),
            Value::UInt(n) => Ok(Decimal::from(n)),
            Value::Float(f) => Decimal::from_f64(f).ok_or_else(|| ConvertError::Overflow {
                value: f.to_string(),
                to: "Decimal",
            }),
            Value::Text(s) => parse_text(&s, "Decimal"),
            Value::Null => Err(ConvertError::UnexpectedNull { to: "Decimal" }),
            other => Err(unsupported(&other, "Decimal")),
        }
    }
}

impl FromValue for Vec<f64> {
    const KIND: ValueKind = ValueKind::Vector;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Vector(v) => Ok(v),
            Value::Array(items) => items
                .into_iter()
                .map(|item| f64::from_value(item))
                .collect(),
            Value::Null => Err(ConvertError::UnexpectedNull { to: "Vec<f64>" }),
            other => Err(unsupported(&other, "Vec<f64>")),
        }
    }
}

impl FromValue for Vec<f32> {
    const KIND: ValueKind = ValueKind::Vector;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        let wide = Vec::<f64>::from_value(value)?;
        Ok(wide.into_iter().map(|f| f as f32).collect())
    }
}

impl FromValue for serde_json::Value {
    const KIND: ValueKind = ValueKind::Json;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Json(j) => Ok(j),
            Value::Text(s) => serde_json::from_str(&s).map_err(|e| ConvertError::Parse {
                text: s,
                to: "serde_json::Value",
                message: e.to_string(),
            }),
            Value::Null => Ok(serde_json::Value::Null),
            other => Err(unsupported(&other, "serde_json::Value")),
        }
    }
}

impl<T> FromValue for Json<T>
where
    T: DeserializeOwned + Serialize + Send + 'static,
{
    const KIND: ValueKind = ValueKind::Json;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Json(j) => serde_json::from_value(j)
                .map(Json)
                .map_err(|e| ConvertError::Json(e.to_string())),
            Value::Text(s) => serde_json::from_str(&s)
                .map(Json)
                .map_err(|e| ConvertError::Json(e.to_string())),
            Value::Bytes(b) => serde_json::from_slice(&b)
                .map(Json)
                .map_err(|e| ConvertError::Json(e.to_string())),
            Value::Null => Err(ConvertError::UnexpectedNull { to: "Json<T>" }),
            other => Err(unsupported(&other, "Json<T>")),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_to_unsigned_rejected() {
        let err = u64::from_value(Value::Int(-5)).unwrap_err();
        assert!(matches!(err, ConvertError::SignLoss { .. }));
        assert_eq!(u64::from_value(Value::Int(5)).unwrap(), 5);
    }

    #[test]
    fn test_unsigned_to_signed_overflow() {
        let err = i64::from_value(Value::UInt(u64::MAX)).unwrap_err();
        assert!(matches!(err, ConvertError::Overflow { .. }));
        assert_eq!(i64::from_value(Value::UInt(7)).unwrap(), 7);
    }

    #[test]
    fn test_fractional_float_to_int_rejected() {
        let err = i64::from_value(Value::Float(1.5)).unwrap_err();
        assert!(matches!(err, ConvertError::PrecisionLoss { .. }));
        assert_eq!(i64::from_value(Value::Float(3.0)).unwrap(), 3);
    }

    #[test]
    fn test_narrowing_checks_range() {
        assert!(i8::from_value(Value::Int(300)).is_err());
        assert_eq!(i8::from_value(Value::Int(-3)).unwrap(), -3);
        assert!(u8::from_value(Value::Int(256)).is_err());
    }

    #[test]
    fn test_text_parsing() {
        assert_eq!(i64::from_value(Value::Text("42".into())).unwrap(), 42);
        assert_eq!(bool::from_value(Value::Text("true".into())).unwrap(), true);
        let err = i64::from_value(Value::Text("not-a-number".into())).unwrap_err();
        assert!(matches!(err, ConvertError::Parse { .. }));
    }

    #[test]
    fn test_primitive_to_text() {
        assert_eq!(String::from_value(Value::Int(9)).unwrap(), "9");
        assert_eq!(String::from_value(Value::Bool(true)).unwrap(), "true");
    }

    #[test]
    fn test_temporal_conversions() {
        let t = DateTime::<Utc>::from_value(Value::Int(0)).unwrap();
        assert_eq!(t.timestamp(), 0);
        let t = DateTime::<Utc>::from_value(Value::Text("2024-05-01T10:00:00Z".into())).unwrap();
        assert_eq!(t.timestamp(), 1714557600);
    }

    #[test]
    fn test_vector_conversions() {
        let v = Vec::<f64>::from_value(Value::Vector(vec![1.0, 2.0])).unwrap();
        assert_eq!(v, vec![1.0, 2.0]);
        let v =
            Vec::<f64>::from_value(Value::Array(vec![Value::Int(1), Value::Float(2.5)])).unwrap();
        assert_eq!(v, vec![1.0, 2.5]);
    }

    #[test]
    fn test_json_composite() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Prefs {
            theme: String,
        }
        let value = Value::Json(serde_json::json!({"theme": "dark"}));
        let Json(prefs) = Json::<Prefs>::from_value(value).unwrap();
        assert_eq!(prefs.theme, "dark");
    }

    #[test]
    fn test_option_null_passthrough() {
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i64>::from_value(Value::Int(3)).unwrap(), Some(3));
    }

    #[test]
    fn test_null_into_non_nullable_rejected() {
        let err = i64::from_value(Value::Null).unwrap_err();
        assert!(matches!(err, ConvertError::UnexpectedNull { .. }));
    }
}
