//! Typed values stored in column families.
//!
//! Every key and value in a family has a declared [`ValueType`]. The
//! [`Value`] ordering within one type matches the order of the encoded bytes
//! (see [`codec`](crate::codec)), so comparing values and comparing stored
//! keys agree.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use widerow_core::RangeEntry;

/// Declared type of a row key, column key, sub-column key or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Utf8,
    Integer,
    Long,
    Uuid,
    /// Version-7 UUIDs, ordered by their embedded timestamp.
    TimeUuid,
    /// 64-bit counter. Only valid as a value type.
    Counter,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Utf8 => "UTF8",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::Uuid => "UUID",
            Self::TimeUuid => "TimeUUID",
            Self::Counter => "Counter",
        })
    }
}

/// A typed key or value.
///
/// Counter values surface as [`Value::Long`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    Utf8(String),
    Integer(i32),
    Long(i64),
    Uuid(Uuid),
    TimeUuid(Uuid),
}

impl Value {
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Utf8(_) => ValueType::Utf8,
            Self::Integer(_) => ValueType::Integer,
            Self::Long(_) => ValueType::Long,
            Self::Uuid(_) => ValueType::Uuid,
            Self::TimeUuid(_) => ValueType::TimeUuid,
        }
    }

    /// A fresh time UUID for the current instant.
    #[must_use]
    pub fn time_uuid_now() -> Self {
        Self::TimeUuid(Uuid::now_v7())
    }

    /// The smallest time UUID of the given millisecond, for use as a
    /// lower scan bound.
    #[must_use]
    pub fn time_uuid_floor(unix_ms: u64) -> Self {
        Self::TimeUuid(uuid::Builder::from_unix_timestamp_millis(unix_ms, &[0x00; 10]).into_uuid())
    }

    /// The largest time UUID of the given millisecond, for use as an upper
    /// scan bound.
    #[must_use]
    pub fn time_uuid_ceiling(unix_ms: u64) -> Self {
        Self::TimeUuid(uuid::Builder::from_unix_timestamp_millis(unix_ms, &[0xff; 10]).into_uuid())
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of `Integer` and `Long` values.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(i64::from(*n)),
            Self::Long(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Long(n) => write!(f, "{n}"),
            Self::Uuid(u) | Self::TimeUuid(u) => write!(f, "{u}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Utf8(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Utf8(s)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Long(n)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

/// A column as returned by a scan: name and decoded value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: Value,
    pub value: Value,
}

impl RangeEntry for Column {
    type Key = Value;

    fn key(&self) -> &Value {
        &self.name
    }
}

/// A super column with all its sub-columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperColumnSlice {
    pub name: Value,
    pub columns: Vec<Column>,
}

impl RangeEntry for SuperColumnSlice {
    type Key = Value;

    fn key(&self) -> &Value {
        &self.name
    }
}
