//! Order-preserving byte encodings for [`Value`]s.
//!
//! The store compares keys as raw bytes, so every encoding here sorts the
//! same way as the values it encodes:
//!
//! - `Integer` / `Long`: big-endian two's complement with the sign bit
//!   flipped.
//! - `Utf8`: the UTF-8 bytes.
//! - `Uuid` / `TimeUuid`: the 16 raw bytes. Time UUIDs are version 7, whose
//!   leading 48 bits are the Unix millisecond.
//! - `Counter`: encoded like `Long`.

use uuid::Uuid;

use crate::error::CodecError;
use crate::types::{Value, ValueType};

const I32_SIGN: u32 = 1 << 31;
const I64_SIGN: u64 = 1 << 63;

/// Encodes `value` as a `ty`.
///
/// # Errors
///
/// [`CodecError::TypeMismatch`] if the value is not of type `ty`.
#[allow(clippy::cast_sign_loss)]
pub fn encode(value: &Value, ty: ValueType) -> Result<Vec<u8>, CodecError> {
    match (ty, value) {
        (ValueType::Utf8, Value::Utf8(s)) => Ok(s.as_bytes().to_vec()),
        (ValueType::Integer, Value::Integer(n)) => {
            Ok(((*n as u32) ^ I32_SIGN).to_be_bytes().to_vec())
        }
        (ValueType::Long | ValueType::Counter, Value::Long(n)) => {
            Ok(((*n as u64) ^ I64_SIGN).to_be_bytes().to_vec())
        }
        (ValueType::Uuid, Value::Uuid(u)) | (ValueType::TimeUuid, Value::TimeUuid(u)) => {
            Ok(u.as_bytes().to_vec())
        }
        (expected, other) => Err(CodecError::TypeMismatch {
            expected,
            found: other.value_type(),
        }),
    }
}

/// Decodes bytes stored as a `ty`.
///
/// # Errors
///
/// [`CodecError::Malformed`] if the bytes cannot be a `ty`.
#[allow(clippy::cast_possible_wrap)]
pub fn decode(bytes: &[u8], ty: ValueType) -> Result<Value, CodecError> {
    let malformed = |reason: String| CodecError::Malformed { ty, reason };
    match ty {
        ValueType::Utf8 => std::str::from_utf8(bytes)
            .map(|s| Value::Utf8(s.to_owned()))
            .map_err(|e| malformed(e.to_string())),
        ValueType::Integer => {
            let raw: [u8; 4] = bytes
                .try_into()
                .map_err(|_| malformed(format!("expected 4 bytes, got {}", bytes.len())))?;
            Ok(Value::Integer((u32::from_be_bytes(raw) ^ I32_SIGN) as i32))
        }
        ValueType::Long | ValueType::Counter => {
            let raw: [u8; 8] = bytes
                .try_into()
                .map_err(|_| malformed(format!("expected 8 bytes, got {}", bytes.len())))?;
            Ok(Value::Long((u64::from_be_bytes(raw) ^ I64_SIGN) as i64))
        }
        ValueType::Uuid | ValueType::TimeUuid => {
            let uuid = Uuid::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
            Ok(if ty == ValueType::Uuid {
                Value::Uuid(uuid)
            } else {
                Value::TimeUuid(uuid)
            })
        }
    }
}

/// Encodes an optional scan bound.
///
/// # Errors
///
/// See [`encode`].
pub fn encode_bound(value: Option<&Value>, ty: ValueType) -> Result<Option<Vec<u8>>, CodecError> {
    value.map(|v| encode(v, ty)).transpose()
}
