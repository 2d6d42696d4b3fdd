//! widerow client: typed keyspaces, column families, rows, super columns and
//! counters over a wide-column store.
//!
//! Every range read is a paged scan from `widerow-core`, so rows of any width
//! are read with bounded memory.

pub mod codec;
pub mod column_family;
pub mod config;
pub mod error;
pub mod fetchers;
pub mod keyspace;
pub mod schema;
pub mod store;
pub mod super_column_family;
pub mod types;

pub use column_family::{ColumnFamily, Row};
pub use config::ClientConfig;
pub use error::{ClientError, CodecError};
pub use keyspace::Keyspace;
pub use schema::ColumnFamilyDef;
pub use store::{ColumnStore, MemoryStore};
pub use super_column_family::{SuperColumn, SuperColumnFamily, SuperRow};
pub use types::{Column, SuperColumnSlice, Value, ValueType};

pub use widerow_core::{BoxCursor, Cursor, CursorError, Finish, PageSize, ScanRange};
