//! Storage Engine: single-file embedded relational database.

mod migrations;
mod sqlite;

pub use sqlite::{resolve_storage_path, QueryFilters, Result, Storage, StorageError};
