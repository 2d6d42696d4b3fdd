//! Client configuration.

use serde::{Deserialize, Serialize};
use widerow_core::PageSize;

/// Page sizes used by the scans a keyspace hands out.
///
/// Page sizes serialize as plain integers: `0` or less means one unbounded
/// fetch, `1` is raised to `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Columns (or super columns) fetched per page within a row.
    pub column_page_size: PageSize,
    /// Row keys fetched per page when listing a family's rows.
    pub row_key_page_size: PageSize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            column_page_size: PageSize::from_config(100),
            row_key_page_size: PageSize::from_config(500),
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_column_page_size(mut self, size: i64) -> Self {
        self.column_page_size = PageSize::from_config(size);
        self
    }

    #[must_use]
    pub fn with_row_key_page_size(mut self, size: i64) -> Self {
        self.row_key_page_size = PageSize::from_config(size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = ClientConfig::default();
        assert_eq!(config.column_page_size.get(), 100);
        assert_eq!(config.row_key_page_size.get(), 500);
    }

    #[test]
    fn builders_normalize_sizes() {
        let config = ClientConfig::default()
            .with_column_page_size(1)
            .with_row_key_page_size(0);
        assert_eq!(config.column_page_size.get(), 2);
        assert!(config.row_key_page_size.is_unbounded());
    }

    #[test]
    fn deserializes_raw_integers() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"column_page_size": -1, "row_key_page_size": 1}"#).unwrap();
        assert!(config.column_page_size.is_unbounded());
        assert_eq!(config.row_key_page_size.get(), 2);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"column_page_size": 10}"#).unwrap();
        assert_eq!(config.column_page_size.get(), 10);
        assert_eq!(config.row_key_page_size.get(), 500);
    }

    #[test]
    fn serializes_raw_integers() {
        let config = ClientConfig::default().with_column_page_size(0);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"column_page_size":0,"row_key_page_size":500}"#);
    }
}
