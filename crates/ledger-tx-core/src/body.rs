//! Structured asset bodies.
//!
//! A structured body is a self-describing MessagePack value. [`BodyValue`] is
//! the dynamic form. Typed callers can go through serde with
//! [`encode_object`] and [`decode_object`]. Both produce the same bytes for
//! equivalent data.
//!
//! The codec is stateless: every call builds its own encoder/decoder.

use rmpv::Value;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CoreError, Result};

/// A dynamically typed structured body.
#[derive(Clone, Debug, PartialEq)]
pub enum BodyValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned values above `i64::MAX`.
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<BodyValue>),
    /// Ordered key/value pairs. Keys may be any value.
    Map(Vec<(BodyValue, BodyValue)>),
}

impl BodyValue {
    /// Encode as MessagePack.
    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &self.to_rmpv())
            .map_err(|e| CoreError::Encoding(e.to_string()))?;
        Ok(buf)
    }

    /// Decode one MessagePack value that spans all of `bytes`.
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self> {
        let mut cursor = bytes;
        let value = rmpv::decode::read_value(&mut cursor)
            .map_err(|e| CoreError::Encoding(e.to_string()))?;
        if !cursor.is_empty() {
            return Err(CoreError::Encoding(format!(
                "{} trailing bytes after structured body",
                cursor.len()
            )));
        }
        Self::from_rmpv(value)
    }

    /// Map lookup by string key.
    pub fn get(&self, key: &str) -> Option<&BodyValue> {
        match self {
            BodyValue::Map(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, BodyValue::String(s) if s == key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            BodyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            BodyValue::Int(v) => Some(v),
            BodyValue::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    fn to_rmpv(&self) -> Value {
        match self {
            BodyValue::Null => Value::Nil,
            BodyValue::Bool(b) => Value::Boolean(*b),
            BodyValue::Int(v) => Value::from(*v),
            BodyValue::UInt(v) => Value::from(*v),
            BodyValue::Float(v) => Value::F64(*v),
            BodyValue::String(s) => Value::from(s.as_str()),
            BodyValue::Bytes(b) => Value::Binary(b.clone()),
            BodyValue::Array(items) => Value::Array(items.iter().map(Self::to_rmpv).collect()),
            BodyValue::Map(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_rmpv(), v.to_rmpv()))
                    .collect(),
            ),
        }
    }

    fn from_rmpv(value: Value) -> Result<Self> {
        Ok(match value {
            Value::Nil => BodyValue::Null,
            Value::Boolean(b) => BodyValue::Bool(b),
            Value::Integer(i) => match (i.as_i64(), i.as_u64()) {
                (Some(v), _) => BodyValue::Int(v),
                (None, Some(v)) => BodyValue::UInt(v),
                (None, None) => {
                    return Err(CoreError::Encoding("integer out of range".into()));
                }
            },
            Value::F32(v) => BodyValue::Float(f64::from(v)),
            Value::F64(v) => BodyValue::Float(v),
            Value::String(s) => match s.into_str() {
                Some(s) => BodyValue::String(s),
                None => return Err(CoreError::Encoding("string is not valid UTF-8".into())),
            },
            Value::Binary(b) => BodyValue::Bytes(b),
            Value::Array(items) => BodyValue::Array(
                items
                    .into_iter()
                    .map(Self::from_rmpv)
                    .collect::<Result<_>>()?,
            ),
            Value::Map(entries) => BodyValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((Self::from_rmpv(k)?, Self::from_rmpv(v)?)))
                    .collect::<Result<_>>()?,
            ),
            Value::Ext(tag, _) => {
                return Err(CoreError::Encoding(format!(
                    "extension type {tag} is not supported in asset bodies"
                )));
            }
        })
    }
}

impl From<&str> for BodyValue {
    fn from(s: &str) -> Self {
        BodyValue::String(s.to_string())
    }
}

impl From<String> for BodyValue {
    fn from(s: String) -> Self {
        BodyValue::String(s)
    }
}

impl From<i64> for BodyValue {
    fn from(v: i64) -> Self {
        BodyValue::Int(v)
    }
}

impl From<bool> for BodyValue {
    fn from(v: bool) -> Self {
        BodyValue::Bool(v)
    }
}

impl From<Vec<u8>> for BodyValue {
    fn from(b: Vec<u8>) -> Self {
        BodyValue::Bytes(b)
    }
}

/// Encode any serde value as a MessagePack structured body.
///
/// Structs are written as maps keyed by field name.
pub fn encode_object<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(value).map_err(|e| CoreError::Encoding(e.to_string()))
}

/// Decode a MessagePack structured body into a serde type.
pub fn decode_object<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    rmp_serde::from_slice(bytes).map_err(|e| CoreError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn sample() -> BodyValue {
        BodyValue::Map(vec![
            (BodyValue::from("name"), BodyValue::from("widget")),
            (BodyValue::from("count"), BodyValue::Int(-3)),
            (
                BodyValue::from("tags"),
                BodyValue::Array(vec![BodyValue::Bool(true), BodyValue::Null]),
            ),
            (BodyValue::from("blob"), BodyValue::Bytes(vec![0, 1, 2])),
            (BodyValue::from("big"), BodyValue::UInt(u64::MAX)),
            (BodyValue::from("ratio"), BodyValue::Float(0.5)),
        ])
    }

    #[test]
    fn test_msgpack_preserves_value() {
        let value = sample();
        let bytes = value.to_msgpack().unwrap();
        assert_eq!(BodyValue::from_msgpack(&bytes).unwrap(), value);
    }

    #[test]
    fn test_map_lookup() {
        let value = sample();
        assert_eq!(value.get("name").and_then(BodyValue::as_str), Some("widget"));
        assert_eq!(value.get("count").and_then(BodyValue::as_i64), Some(-3));
        assert!(value.get("missing").is_none());
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = BodyValue::Int(1).to_msgpack().unwrap();
        bytes.push(0xc0);
        assert!(matches!(
            BodyValue::from_msgpack(&bytes),
            Err(CoreError::Encoding(_))
        ));
    }

    #[test]
    fn test_truncated_input_rejected() {
        let bytes = BodyValue::from("hello").to_msgpack().unwrap();
        assert!(BodyValue::from_msgpack(&bytes[..3]).is_err());
    }

    #[test]
    fn test_typed_object_matches_dynamic_view() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Payment {
            from: String,
            amount: i64,
        }

        let payment = Payment {
            from: "alice".into(),
            amount: 42,
        };
        let bytes = encode_object(&payment).unwrap();

        let dynamic = BodyValue::from_msgpack(&bytes).unwrap();
        assert_eq!(dynamic.get("from").and_then(BodyValue::as_str), Some("alice"));
        assert_eq!(dynamic.get("amount").and_then(BodyValue::as_i64), Some(42));

        let recovered: Payment = decode_object(&bytes).unwrap();
        assert_eq!(recovered, payment);
    }
}
