//! Parsed resource values delivered by the protocol engine

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single decoded resource value
///
/// The protocol engine decodes text and TLV payloads into these variants;
/// the server never interprets raw payload bytes itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    /// UTF-8 text value
    Text(String),
    /// Signed integer
    Integer(i64),
    /// Floating point
    Float(f64),
    /// Boolean
    Boolean(bool),
    /// Raw bytes the engine could not decode further
    Opaque(Bytes),
    /// Object link (object id, instance id)
    ObjectLink(u16, u8),
}

impl DataValue {
    /// Text content, if the value is textual
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Text(s) => write!(f, "{}", s),
            DataValue::Integer(v) => write!(f, "{}", v),
            DataValue::Float(v) => write!(f, "{}", v),
            DataValue::Boolean(v) => write!(f, "{}", v),
            DataValue::Opaque(b) => write!(f, "({} bytes)", b.len()),
            DataValue::ObjectLink(object_id, instance_id) => {
                write!(f, "{}:{}", object_id, instance_id)
            }
        }
    }
}

/// One decoded record of a payload: a Resource ID paired with its value
///
/// Resource-scoped payloads decode to a single record; Object-scoped
/// payloads decode to one record per resource the client reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRecord {
    /// Resource ID the value belongs to
    pub id: u16,
    /// Decoded value
    pub value: DataValue,
}

impl DataRecord {
    /// Create a record
    pub fn new(id: u16, value: DataValue) -> Self {
        Self { id, value }
    }

    /// Shorthand for a textual record
    pub fn text(id: u16, value: impl Into<String>) -> Self {
        Self {
            id,
            value: DataValue::Text(value.into()),
        }
    }
}
