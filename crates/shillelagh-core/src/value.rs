//! Column values.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result, SerializationError};

/// A single column value travelling between a model and the storage engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    /// Stored as INTEGER 0/1.
    Bool(bool),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
}

impl Value {
    /// True for `Value::Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for values that can only travel as a bound parameter.
    #[must_use]
    pub const fn is_blob(&self) -> bool {
        matches!(self, Value::Bytes(_))
    }

    /// Widen any integer-like value to `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::TinyInt(v) => Some(i64::from(*v)),
            Value::SmallInt(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::BigInt(v) | Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// Widen any floating value to `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Render the value as an inline SQL literal.
    ///
    /// Text is wrapped in single quotes without escaping, matching the legacy
    /// statement text. Returns `None` for blobs and non-finite floats, which have no
    /// literal form here and must be bound as parameters.
    #[must_use]
    pub fn to_sql_literal(&self) -> Option<String> {
        match self {
            Value::Null => Some("NULL".to_string()),
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Value::TinyInt(v) => Some(v.to_string()),
            Value::SmallInt(v) => Some(v.to_string()),
            Value::Int(v) => Some(v.to_string()),
            Value::BigInt(v) | Value::Timestamp(v) => Some(v.to_string()),
            Value::Float(v) => v.is_finite().then(|| v.to_string()),
            Value::Double(v) => v.is_finite().then(|| v.to_string()),
            Value::Text(s) => Some(format!("'{}'", s)),
            Value::Bytes(_) => None,
        }
    }
}

/// Conversion of a field into a column [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

macro_rules! impl_to_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_to_value! {
    bool => Bool,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
}

impl ToValue for u8 {
    fn to_value(&self) -> Value {
        Value::SmallInt(i16::from(*self))
    }
}

impl ToValue for u16 {
    fn to_value(&self) -> Value {
        Value::Int(i32::from(*self))
    }
}

impl ToValue for u32 {
    fn to_value(&self) -> Value {
        Value::BigInt(i64::from(*self))
    }
}

impl ToValue for char {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::Timestamp(self.epoch_millis())
    }
}

impl ToValue for SystemTime {
    fn to_value(&self) -> Value {
        Value::Timestamp(self.epoch_millis())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

/// Date-like types that persist as epoch milliseconds.
pub trait DateMillis {
    fn epoch_millis(&self) -> i64;
}

impl DateMillis for DateTime<Utc> {
    fn epoch_millis(&self) -> i64 {
        self.timestamp_millis()
    }
}

impl DateMillis for SystemTime {
    fn epoch_millis(&self) -> i64 {
        match self.duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
            Err(e) => -i64::try_from(e.duration().as_millis()).unwrap_or(i64::MAX),
        }
    }
}

/// Serialize an arbitrary object into a BLOB value.
pub fn encode_object<T: Serialize + ?Sized>(object: &T) -> Result<Value> {
    serde_json::to_vec(object).map(Value::Bytes).map_err(|e| {
        Error::Serialization(SerializationError {
            type_name: std::any::type_name::<T>(),
            source: e,
        })
    })
}

/// Decode a BLOB produced by [`encode_object`].
pub fn decode_object<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        Error::Serialization(SerializationError {
            type_name: std::any::type_name::<T>(),
            source: e,
        })
    })
}
