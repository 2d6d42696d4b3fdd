//! Keyspaces: the registry of column family definitions over one store.
//!
//! Families are registered locally first, then [`Keyspace::sync_schema`]
//! creates the ones the store does not know about yet. Existing families
//! are never altered.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::column_family::{ColumnFamily, FamilyHandle};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::schema::ColumnFamilyDef;
use crate::store::ColumnStore;
use crate::super_column_family::SuperColumnFamily;
use crate::types::ValueType;

/// A named keyspace bound to a [`ColumnStore`].
pub struct Keyspace {
    name: String,
    store: Arc<dyn ColumnStore>,
    config: ClientConfig,
    families: RwLock<BTreeMap<String, Arc<ColumnFamilyDef>>>,
}

impl std::fmt::Debug for Keyspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyspace")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("families", &self.families.read().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Keyspace {
    #[must_use]
    pub fn new(name: impl Into<String>, store: Arc<dyn ColumnStore>, config: ClientConfig) -> Self {
        Self {
            name: name.into(),
            store,
            config,
            families: RwLock::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config(&self) -> ClientConfig {
        self.config
    }

    /// Registers a definition.
    ///
    /// # Errors
    ///
    /// [`ClientError::DuplicateColumnFamily`] if the name is taken, by a
    /// standard or a super family.
    pub fn add_definition(&self, def: ColumnFamilyDef) -> Result<(), ClientError> {
        let mut families = self.families.write();
        if families.contains_key(&def.name) {
            return Err(ClientError::DuplicateColumnFamily(def.name));
        }
        tracing::debug!(
            keyspace = %self.name,
            family = %def.name,
            super_family = def.is_super(),
            "column family registered"
        );
        families.insert(def.name.clone(), Arc::new(def));
        Ok(())
    }

    /// Registers a standard column family.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidKeyType`] for counter keys,
    /// [`ClientError::DuplicateColumnFamily`] for a taken name.
    pub fn add_column_family(
        &self,
        name: &str,
        row_key_type: ValueType,
        column_key_type: ValueType,
        value_type: ValueType,
    ) -> Result<ColumnFamily, ClientError> {
        self.add_definition(ColumnFamilyDef::standard(
            name,
            row_key_type,
            column_key_type,
            value_type,
        )?)?;
        self.column_family(name)
    }

    /// Registers a super column family.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidKeyType`] for counter keys,
    /// [`ClientError::DuplicateColumnFamily`] for a taken name.
    pub fn add_super_column_family(
        &self,
        name: &str,
        row_key_type: ValueType,
        column_key_type: ValueType,
        sub_column_key_type: ValueType,
        value_type: ValueType,
    ) -> Result<SuperColumnFamily, ClientError> {
        self.add_definition(ColumnFamilyDef::super_family(
            name,
            row_key_type,
            column_key_type,
            sub_column_key_type,
            value_type,
        )?)?;
        self.super_column_family(name)
    }

    fn handle(&self, name: &str) -> Result<FamilyHandle, ClientError> {
        let def = self
            .families
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::UnknownColumnFamily(name.to_owned()))?;
        Ok(FamilyHandle {
            store: Arc::clone(&self.store),
            def,
            config: self.config,
        })
    }

    /// Handle to a registered standard family.
    ///
    /// # Errors
    ///
    /// [`ClientError::UnknownColumnFamily`], or
    /// [`ClientError::TypeMismatch`] for a super family.
    pub fn column_family(&self, name: &str) -> Result<ColumnFamily, ClientError> {
        let handle = self.handle(name)?;
        if handle.def.is_super() {
            return Err(ClientError::TypeMismatch {
                family: name.to_owned(),
                expected: "standard",
            });
        }
        Ok(ColumnFamily::new(handle))
    }

    /// Handle to a registered super family.
    ///
    /// # Errors
    ///
    /// [`ClientError::UnknownColumnFamily`], or
    /// [`ClientError::TypeMismatch`] for a standard family.
    pub fn super_column_family(&self, name: &str) -> Result<SuperColumnFamily, ClientError> {
        let handle = self.handle(name)?;
        if !handle.def.is_super() {
            return Err(ClientError::TypeMismatch {
                family: name.to_owned(),
                expected: "super",
            });
        }
        Ok(SuperColumnFamily::new(handle))
    }

    /// Creates every registered family the store does not have yet.
    /// Returns the names created.
    ///
    /// # Errors
    ///
    /// Store failures while describing or creating families.
    pub fn sync_schema(&self) -> Result<Vec<String>, ClientError> {
        let existing: HashSet<String> = self.store.describe_families()?.into_iter().collect();
        tracing::trace!(keyspace = %self.name, existing = existing.len(), "schema described");

        let missing: Vec<Arc<ColumnFamilyDef>> = self
            .families
            .read()
            .values()
            .filter(|def| !existing.contains(&def.name))
            .cloned()
            .collect();

        if missing.is_empty() {
            tracing::trace!(keyspace = %self.name, "all column families already exist");
            return Ok(Vec::new());
        }

        let mut created = Vec::with_capacity(missing.len());
        for def in missing {
            tracing::trace!(
                keyspace = %self.name,
                family = %def.name,
                "column family not found, creating"
            );
            self.store.create_family(&def)?;
            tracing::info!(keyspace = %self.name, family = %def.name, "column family created");
            created.push(def.name.clone());
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn keyspace() -> (Arc<MemoryStore>, Keyspace) {
        let store = Arc::new(MemoryStore::new());
        let ks = Keyspace::new(
            "ks",
            Arc::clone(&store) as Arc<dyn ColumnStore>,
            ClientConfig::default(),
        );
        (store, ks)
    }

    #[test]
    fn duplicate_names_are_rejected_across_kinds() {
        let (_, ks) = keyspace();
        ks.add_column_family("users", ValueType::Utf8, ValueType::Utf8, ValueType::Utf8)
            .unwrap();
        let err = ks
            .add_super_column_family(
                "users",
                ValueType::Utf8,
                ValueType::Utf8,
                ValueType::Utf8,
                ValueType::Utf8,
            )
            .unwrap_err();
        assert!(matches!(err, ClientError::DuplicateColumnFamily(name) if name == "users"));
    }

    #[test]
    fn lookups_check_family_kind() {
        let (_, ks) = keyspace();
        ks.add_column_family("plain", ValueType::Utf8, ValueType::Utf8, ValueType::Utf8)
            .unwrap();
        assert!(ks.column_family("plain").is_ok());
        assert!(matches!(
            ks.super_column_family("plain"),
            Err(ClientError::TypeMismatch { expected: "super", .. })
        ));
        assert!(matches!(
            ks.column_family("nope"),
            Err(ClientError::UnknownColumnFamily(_))
        ));
    }

    #[test]
    fn invalid_definitions_are_not_registered() {
        let (_, ks) = keyspace();
        assert!(matches!(
            ks.add_column_family("c", ValueType::Counter, ValueType::Utf8, ValueType::Utf8),
            Err(ClientError::InvalidKeyType { .. })
        ));
        assert!(ks.column_family("c").is_err());
    }

    #[test]
    fn sync_creates_only_missing_families() {
        let (store, ks) = keyspace();
        ks.add_column_family("a", ValueType::Utf8, ValueType::Utf8, ValueType::Utf8)
            .unwrap();
        assert_eq!(ks.sync_schema().unwrap(), vec!["a"]);

        ks.add_super_column_family(
            "b",
            ValueType::Utf8,
            ValueType::Utf8,
            ValueType::Utf8,
            ValueType::Counter,
        )
        .unwrap();
        assert_eq!(ks.sync_schema().unwrap(), vec!["b"]);
        assert!(ks.sync_schema().unwrap().is_empty());

        assert_eq!(store.describe_families().unwrap(), vec!["a", "b"]);
        assert_eq!(store.family_def("b").unwrap().replicate_on_write(), Some(true));
    }

    #[test]
    fn explicit_definitions_keep_their_settings() {
        let (store, ks) = keyspace();
        let def = ColumnFamilyDef::standard(
            "hits",
            ValueType::Utf8,
            ValueType::Utf8,
            ValueType::Counter,
        )
        .unwrap()
        .with_replicate_on_write(false);
        ks.add_definition(def).unwrap();
        ks.sync_schema().unwrap();
        assert_eq!(store.family_def("hits").unwrap().replicate_on_write(), Some(false));
    }

    #[test]
    fn sync_surfaces_store_failures() {
        let (store, ks) = keyspace();
        store.set_offline(true);
        assert!(matches!(ks.sync_schema(), Err(ClientError::Store(_))));
    }
}
