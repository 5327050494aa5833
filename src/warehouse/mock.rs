//! Mock warehouse for testing.
//!
//! Records every statement it receives and answers queries with configured
//! rows. Statement kinds can be set to fail, which lets tests exercise
//! partial failures without a real control plane.

use std::collections::HashSet;
use std::sync::Mutex;

use super::{Row, Warehouse, WarehouseError, WarehouseResult};
use crate::statement::Statement;

/// Configuration for mock warehouse behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Rows returned by every query.
    pub rows: Vec<Row>,
    /// Statement kind labels (see `StatementKind::label`) that fail.
    pub fail_on: HashSet<&'static str>,
    /// If true, every call fails as if the connection dropped.
    pub unavailable: bool,
}

impl MockConfig {
    /// Create a config whose queries return the given rows.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    /// Make statements with the given kind label fail.
    pub fn failing_on(mut self, label: &'static str) -> Self {
        self.fail_on.insert(label);
        self
    }

    /// Create a config where every call fails.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }
}

/// Mock warehouse for testing.
///
/// # Examples
///
/// ```ignore
/// use snowshare::warehouse::mock::{MockConfig, MockWarehouse};
///
/// let warehouse = MockWarehouse::with_config(MockConfig::default().failing_on("set_accounts"));
/// // ... run an operation ...
/// assert_eq!(warehouse.executed_sql().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockWarehouse {
    config: Mutex<MockConfig>,
    statements: Mutex<Vec<Statement>>,
}

impl MockWarehouse {
    /// Create a mock that accepts everything and returns no rows.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config: Mutex::new(config),
            statements: Mutex::new(Vec::new()),
        }
    }

    /// Replace the rows returned by subsequent queries.
    pub fn set_rows(&self, rows: Vec<Row>) {
        self.config
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .rows = rows;
    }

    /// All statements received so far, in order.
    pub fn statements(&self) -> Vec<Statement> {
        self.statements
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// SQL text of all statements received so far.
    pub fn executed_sql(&self) -> Vec<String> {
        self.statements()
            .iter()
            .map(|s| s.sql().to_string())
            .collect()
    }

    /// Forget recorded statements.
    pub fn clear(&self) {
        self.statements
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn record(&self, statement: &Statement) -> WarehouseResult<MockConfig> {
        self.statements
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(statement.clone());

        let config = self
            .config
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        if config.unavailable {
            return Err(WarehouseError::Unavailable(
                "mock connection refused".to_string(),
            ));
        }
        let label = statement.kind().label();
        if config.fail_on.contains(label) {
            return Err(WarehouseError::Rejected(format!(
                "mock failure for {}",
                label
            )));
        }
        Ok(config)
    }
}

impl Warehouse for MockWarehouse {
    fn execute(&self, statement: &Statement) -> WarehouseResult<()> {
        self.record(statement)?;
        Ok(())
    }

    fn query(&self, statement: &Statement) -> WarehouseResult<Vec<Row>> {
        let config = self.record(statement)?;
        Ok(config.rows)
    }
}
