//! Warehouse connections
//!
//! This module provides the seam between the reconciler and the data-warehouse
//! control plane. Hosts plug their own driver in by implementing `Warehouse`;
//! the crate ships a SQLite-backed emulated warehouse and a recording mock.

use thiserror::Error;

use crate::statement::Statement;

pub mod mock;
mod sqlite;

pub use sqlite::{default_db_path, SqliteWarehouse};

/// Error types for warehouse operations
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Statement rejected: {0}")]
    Rejected(String),

    #[error("Unsupported statement: {0}")]
    Unsupported(String),

    #[error("Connection unavailable: {0}")]
    Unavailable(String),
}

/// Result type for warehouse operations
pub type WarehouseResult<T> = Result<T, WarehouseError>;

/// One result row; every column is a nullable string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<Option<String>>,
}

impl Row {
    pub fn new(columns: Vec<Option<String>>) -> Self {
        Self { columns }
    }

    /// Build a row where every column is non-null.
    pub fn from_strings<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(|c| Some(c.into())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column value, with NULL and out-of-range both read as `""`.
    pub fn string(&self, idx: usize) -> &str {
        self.columns
            .get(idx)
            .and_then(|c| c.as_deref())
            .unwrap_or("")
    }
}

/// Connection to a warehouse control plane.
///
/// Calls are blocking. The handle is owned by the caller; implementations
/// neither retry nor time out.
pub trait Warehouse {
    /// Execute a statement that returns no rows.
    fn execute(&self, statement: &Statement) -> WarehouseResult<()>;

    /// Execute a statement and return all rows.
    fn query(&self, statement: &Statement) -> WarehouseResult<Vec<Row>>;
}
