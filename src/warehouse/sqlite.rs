//! SQLite-backed emulated warehouse
//!
//! Keeps shares and their grantees in a local database and answers share
//! statements the way the remote control plane does, including the account
//! locator prefix on returned names and the `", "`-joined grantee column.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{Row, Warehouse, WarehouseError, WarehouseResult};
use crate::identifier::GRANTEE_SEPARATOR;
use crate::schema::ShareProperty;
use crate::statement::{Statement, StatementKind};

/// Kind reported for shares created in this account.
const OUTBOUND: &str = "OUTBOUND";

/// Default owning role for new shares.
pub const DEFAULT_OWNER: &str = "ACCOUNTADMIN";

/// Emulated warehouse handle
pub struct SqliteWarehouse {
    conn: Connection,
    /// Locator prepended to share names in `SHOW SHARES` output.
    account: String,
    owner: String,
}

impl SqliteWarehouse {
    /// Open or create an emulated warehouse at the specified path
    pub fn open(path: &Path, account: &str) -> WarehouseResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(WarehouseError::CreateDir)?;
        }

        let conn = Connection::open(path)?;
        Self::with_connection(conn, account)
    }

    /// Open an in-memory warehouse (for testing)
    pub fn open_in_memory(account: &str) -> WarehouseResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, account)
    }

    fn with_connection(conn: Connection, account: &str) -> WarehouseResult<Self> {
        let warehouse = Self {
            conn,
            account: account.to_string(),
            owner: DEFAULT_OWNER.to_string(),
        };
        warehouse.create_tables()?;
        Ok(warehouse)
    }

    /// Set the role reported as owner of shares.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    fn create_tables(&self) -> WarehouseResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS shares (
                name TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                database_name TEXT,
                owner TEXT NOT NULL,
                comment TEXT,
                created_on TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS share_accounts (
                share_name TEXT NOT NULL REFERENCES shares(name) ON DELETE CASCADE,
                account TEXT NOT NULL,
                PRIMARY KEY (share_name, account)
            );

            PRAGMA foreign_keys = ON;
            "#,
        )?;
        Ok(())
    }

    fn share_exists(&self, name: &str) -> WarehouseResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM shares WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn require_share(&self, name: &str) -> WarehouseResult<()> {
        if self.share_exists(name)? {
            Ok(())
        } else {
            Err(missing_share(name))
        }
    }

    fn create_share(&self, name: &str, comment: Option<&str>) -> WarehouseResult<()> {
        if self.share_exists(name)? {
            return Err(WarehouseError::Rejected(format!(
                "Object '{}' already exists.",
                name
            )));
        }
        self.conn.execute(
            r#"
            INSERT INTO shares (name, kind, database_name, owner, comment, created_on)
            VALUES (?1, ?2, NULL, ?3, ?4, ?5)
            "#,
            params![
                name,
                OUTBOUND,
                self.owner,
                comment,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn set_accounts(&self, name: &str, accounts: &BTreeSet<String>) -> WarehouseResult<()> {
        self.require_share(name)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM share_accounts WHERE share_name = ?1",
            params![name],
        )?;
        for account in accounts {
            tx.execute(
                "INSERT INTO share_accounts (share_name, account) VALUES (?1, ?2)",
                params![name, account],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn remove_accounts(&self, name: &str, accounts: &BTreeSet<String>) -> WarehouseResult<()> {
        self.require_share(name)?;
        let tx = self.conn.unchecked_transaction()?;
        for account in accounts {
            tx.execute(
                "DELETE FROM share_accounts WHERE share_name = ?1 AND account = ?2",
                params![name, account],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn set_property(
        &self,
        name: &str,
        property: ShareProperty,
        value: Option<&str>,
    ) -> WarehouseResult<()> {
        self.require_share(name)?;
        match property {
            ShareProperty::Comment => {
                self.conn.execute(
                    "UPDATE shares SET comment = ?1 WHERE name = ?2",
                    params![value, name],
                )?;
            }
        }
        Ok(())
    }

    fn drop_share(&self, name: &str) -> WarehouseResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM shares WHERE name = ?1", params![name])?;
        if deleted == 0 {
            return Err(missing_share(name));
        }
        Ok(())
    }

    fn grantees(&self, name: &str) -> WarehouseResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT account FROM share_accounts WHERE share_name = ?1 ORDER BY account",
        )?;
        let accounts = stmt
            .query_map(params![name], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    /// `SHOW SHARES LIKE <pattern>`; matching is case-insensitive and `\`
    /// escapes wildcards.
    fn show_shares(&self, pattern: &str) -> WarehouseResult<Vec<Row>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT created_on, kind, name, database_name, owner, comment
            FROM shares
            WHERE name LIKE ?1 ESCAPE '\'
            ORDER BY name
            "#,
        )?;

        let mut raw = Vec::new();
        let mut rows = stmt.query(params![pattern])?;
        while let Some(row) = rows.next()? {
            raw.push(ShowRowData::from_row(row)?);
        }

        let mut result = Vec::with_capacity(raw.len());
        for data in raw {
            let to = self.grantees(&data.name)?.join(GRANTEE_SEPARATOR);
            result.push(data.into_row(&self.account, to));
        }
        Ok(result)
    }
}

impl Warehouse for SqliteWarehouse {
    fn execute(&self, statement: &Statement) -> WarehouseResult<()> {
        debug!(kind = statement.kind().label(), "emulated warehouse execute");
        match statement.kind() {
            StatementKind::Create { name, comment } => self.create_share(name, comment.as_deref()),
            StatementKind::SetAccounts { name, accounts } => self.set_accounts(name, accounts),
            StatementKind::RemoveAccounts { name, accounts } => {
                self.remove_accounts(name, accounts)
            }
            StatementKind::SetProperty {
                name,
                property,
                value,
            } => self.set_property(name, *property, Some(value.as_str())),
            StatementKind::UnsetProperty { name, property } => {
                self.set_property(name, *property, None)
            }
            StatementKind::Drop { name } => self.drop_share(name),
            StatementKind::Show { .. } => Err(WarehouseError::Unsupported(format!(
                "{} returns rows; run it as a query",
                statement
            ))),
        }
    }

    fn query(&self, statement: &Statement) -> WarehouseResult<Vec<Row>> {
        debug!(kind = statement.kind().label(), "emulated warehouse query");
        match statement.kind() {
            StatementKind::Show { pattern } => self.show_shares(pattern),
            _ => Err(WarehouseError::Unsupported(format!(
                "{} does not return rows",
                statement
            ))),
        }
    }
}

/// Get the default emulated warehouse path
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("snowshare")
        .join("warehouse.db")
}

fn missing_share(name: &str) -> WarehouseError {
    WarehouseError::Rejected(format!(
        "Share '{}' does not exist or not authorized.",
        name
    ))
}

/// Raw `shares` columns, read before grantees are attached.
struct ShowRowData {
    created_on: String,
    kind: String,
    name: String,
    database_name: Option<String>,
    owner: String,
    comment: Option<String>,
}

impl ShowRowData {
    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            created_on: row.get(0)?,
            kind: row.get(1)?,
            name: row.get(2)?,
            database_name: row.get(3)?,
            owner: row.get(4)?,
            comment: row.get(5)?,
        })
    }

    /// Column order matches the remote `SHOW SHARES` output.
    fn into_row(self, account: &str, to: String) -> Row {
        Row::new(vec![
            Some(self.created_on),
            Some(self.kind),
            Some(format!("{}.{}", account, self.name)),
            self.database_name,
            Some(to),
            Some(self.owner),
            self.comment,
        ])
    }
}
