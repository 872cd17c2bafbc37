//! Versioned, typed encoding of call history entries
//!
//! Inputs and outputs are stored as JSON records tagged with a format
//! version. Output records carry the 1-based position of the input they
//! answer, so replay pairs calls by that position rather than by list index.

use crate::cache::types::StoredValue;
use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current history record format
pub const HISTORY_FORMAT_VERSION: u8 = 1;

/// A single argument or result captured in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum HistoryValue {
    Text(String),
    Binary(Vec<u8>),
    Integer(i64),
    /// Kept as text so NaN and infinities survive JSON
    Float(#[serde(with = "float_text")] f64),
    Bool(bool),
    Absent,
    List(Vec<HistoryValue>),
}

mod float_text {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse::<f64>().map_err(D::Error::custom)
    }
}

impl fmt::Display for HistoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryValue::Text(s) => write!(f, "{:?}", s),
            HistoryValue::Binary(b) => write!(f, "b\"{}\"", b.escape_ascii()),
            HistoryValue::Integer(i) => write!(f, "{}", i),
            HistoryValue::Float(x) => write!(f, "{:?}", x),
            HistoryValue::Bool(b) => write!(f, "{}", b),
            HistoryValue::Absent => write!(f, "None"),
            HistoryValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Types that can be captured in call history
pub trait Recordable {
    fn to_history(&self) -> HistoryValue;
}

impl Recordable for HistoryValue {
    fn to_history(&self) -> HistoryValue {
        self.clone()
    }
}

impl Recordable for StoredValue {
    fn to_history(&self) -> HistoryValue {
        match self {
            StoredValue::Text(s) => HistoryValue::Text(s.clone()),
            StoredValue::Binary(b) => HistoryValue::Binary(b.clone()),
            StoredValue::Integer(i) => HistoryValue::Integer(*i),
            StoredValue::Float(x) => HistoryValue::Float(*x),
        }
    }
}

impl Recordable for str {
    fn to_history(&self) -> HistoryValue {
        HistoryValue::Text(self.to_string())
    }
}

impl Recordable for String {
    fn to_history(&self) -> HistoryValue {
        HistoryValue::Text(self.clone())
    }
}

impl Recordable for Vec<u8> {
    fn to_history(&self) -> HistoryValue {
        HistoryValue::Binary(self.clone())
    }
}

impl Recordable for i64 {
    fn to_history(&self) -> HistoryValue {
        HistoryValue::Integer(*self)
    }
}

impl Recordable for i32 {
    fn to_history(&self) -> HistoryValue {
        HistoryValue::Integer(i64::from(*self))
    }
}

impl Recordable for u64 {
    fn to_history(&self) -> HistoryValue {
        match i64::try_from(*self) {
            Ok(i) => HistoryValue::Integer(i),
            Err(_) => HistoryValue::Text(self.to_string()),
        }
    }
}

impl Recordable for f64 {
    fn to_history(&self) -> HistoryValue {
        HistoryValue::Float(*self)
    }
}

impl Recordable for bool {
    fn to_history(&self) -> HistoryValue {
        HistoryValue::Bool(*self)
    }
}

impl Recordable for () {
    fn to_history(&self) -> HistoryValue {
        HistoryValue::Absent
    }
}

impl<T: Recordable> Recordable for Option<T> {
    fn to_history(&self) -> HistoryValue {
        match self {
            Some(v) => v.to_history(),
            None => HistoryValue::Absent,
        }
    }
}

impl<T: Recordable + ?Sized> Recordable for &T {
    fn to_history(&self) -> HistoryValue {
        (**self).to_history()
    }
}

/// Body of a history record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordBody {
    /// Arguments of a call, appended to the inputs list
    Call { args: Vec<HistoryValue> },

    /// Result of the call at input position `call`
    Returned { call: u64, value: HistoryValue },

    /// The call at input position `call` failed
    Failed { call: u64, error: String },
}

/// One entry of an inputs or outputs list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub v: u8,
    #[serde(flatten)]
    pub body: RecordBody,
}

impl HistoryRecord {
    /// Input record
    pub fn call(args: Vec<HistoryValue>) -> Self {
        Self::from_body(RecordBody::Call { args })
    }

    /// Output record for a successful call
    pub fn returned(call: u64, value: HistoryValue) -> Self {
        Self::from_body(RecordBody::Returned { call, value })
    }

    /// Output record for a failed call
    pub fn failed(call: u64, error: impl Into<String>) -> Self {
        Self::from_body(RecordBody::Failed {
            call,
            error: error.into(),
        })
    }

    fn from_body(body: RecordBody) -> Self {
        Self {
            v: HISTORY_FORMAT_VERSION,
            body,
        }
    }

    /// Encode for a backend list
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a backend list entry, rejecting unknown format versions
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(raw)?;

        match value.get("v").and_then(|v| v.as_u64()) {
            Some(v) if v == u64::from(HISTORY_FORMAT_VERSION) => {}
            Some(v) => {
                return Err(CacheError::SerializationError(format!(
                    "unsupported history format version {}",
                    v
                )))
            }
            None => {
                return Err(CacheError::SerializationError(
                    "history record has no format version".to_string(),
                ))
            }
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Input position answered by an output record
    pub fn answers(&self) -> Option<u64> {
        match self.body {
            RecordBody::Call { .. } => None,
            RecordBody::Returned { call, .. } | RecordBody::Failed { call, .. } => Some(call),
        }
    }
}
