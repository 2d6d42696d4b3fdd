//! Column family definitions.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::types::ValueType;

/// Definition of a standard or super column family.
///
/// A family is a super family when it declares a sub-column key type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFamilyDef {
    /// Family name, unique within a keyspace.
    pub name: String,
    pub row_key_type: ValueType,
    /// Type of column names, or of super-column names in a super family.
    pub column_key_type: ValueType,
    /// Type of sub-column names. `Some` only for super families.
    pub sub_column_key_type: Option<ValueType>,
    pub value_type: ValueType,
    /// Explicit replicate-on-write setting. See
    /// [`replicate_on_write`](Self::replicate_on_write).
    replicate_on_write: Option<bool>,
}

impl ColumnFamilyDef {
    /// Defines a standard column family.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidKeyType`] if a key type is `Counter`.
    pub fn standard(
        name: impl Into<String>,
        row_key_type: ValueType,
        column_key_type: ValueType,
        value_type: ValueType,
    ) -> Result<Self, ClientError> {
        Self {
            name: name.into(),
            row_key_type,
            column_key_type,
            sub_column_key_type: None,
            value_type,
            replicate_on_write: None,
        }
        .validated()
    }

    /// Defines a super column family.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidKeyType`] if a key type is `Counter`.
    pub fn super_family(
        name: impl Into<String>,
        row_key_type: ValueType,
        column_key_type: ValueType,
        sub_column_key_type: ValueType,
        value_type: ValueType,
    ) -> Result<Self, ClientError> {
        Self {
            name: name.into(),
            row_key_type,
            column_key_type,
            sub_column_key_type: Some(sub_column_key_type),
            value_type,
            replicate_on_write: None,
        }
        .validated()
    }

    fn validated(self) -> Result<Self, ClientError> {
        let keys = [
            ("row key", Some(self.row_key_type)),
            ("column key", Some(self.column_key_type)),
            ("sub-column key", self.sub_column_key_type),
        ];
        for (role, ty) in keys {
            if ty == Some(ValueType::Counter) {
                return Err(ClientError::InvalidKeyType {
                    family: self.name,
                    role,
                    ty: ValueType::Counter,
                });
            }
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_replicate_on_write(mut self, replicate_on_write: bool) -> Self {
        self.replicate_on_write = Some(replicate_on_write);
        self
    }

    /// Effective replicate-on-write setting. Counter families replicate on
    /// write unless told otherwise; other families leave it to the store.
    #[must_use]
    pub fn replicate_on_write(&self) -> Option<bool> {
        match self.replicate_on_write {
            None if self.is_counter() => Some(true),
            explicit => explicit,
        }
    }

    #[must_use]
    pub fn is_super(&self) -> bool {
        self.sub_column_key_type.is_some()
    }

    #[must_use]
    pub fn is_counter(&self) -> bool {
        self.value_type == ValueType::Counter
    }

    /// Key type of the columns a scan inside this family returns: the
    /// sub-column type for super families.
    #[must_use]
    pub fn leaf_key_type(&self) -> ValueType {
        self.sub_column_key_type.unwrap_or(self.column_key_type)
    }
}
