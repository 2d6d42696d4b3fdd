//! Error types for the storage-client layer.

use widerow_core::CursorError;

use crate::types::ValueType;

/// Failure to convert between a [`Value`](crate::Value) and stored bytes.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("expected a {expected} value, got {found}")]
    TypeMismatch { expected: ValueType, found: ValueType },

    #[error("malformed {ty} bytes: {reason}")]
    Malformed { ty: ValueType, reason: String },
}

/// Errors surfaced by keyspaces, column families and their rows.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("unknown column family: {0}")]
    UnknownColumnFamily(String),

    #[error("column family already registered: {0}")]
    DuplicateColumnFamily(String),

    /// Only values may be counters; keys never are.
    #[error("column family {family}: {role} type cannot be {ty}")]
    InvalidKeyType {
        family: String,
        role: &'static str,
        ty: ValueType,
    },

    #[error("column family {0} does not hold counters")]
    CounterRequired(String),

    #[error("column family {0} holds counters; use increment_counter")]
    CounterNotAllowed(String),

    /// A standard family was used as a super family or the reverse.
    #[error("column family {family} is not a {expected} column family")]
    TypeMismatch {
        family: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),
}
