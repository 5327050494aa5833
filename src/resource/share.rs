//! Share resource handler
//!
//! Translates declared share configuration into share statements and decodes
//! `SHOW SHARES` rows back into observed state. Accounts are handled outside
//! the generic property updater because the warehouse only accepts them
//! through `ALTER SHARE ... SET ACCOUNTS=`.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use super::{Resource, ResourceData, ShareState};
use crate::error::{ShareError, ShareResult};
use crate::identifier::{split_grantee_list, strip_account_from_name};
use crate::schema::ResourceSchema;
use crate::statement::{ShareBuilder, Statement};
use crate::warehouse::{Row, Warehouse};

/// Columns of a `SHOW SHARES` row, in order.
mod column {
    pub const NAME: usize = 2;
    pub const TO: usize = 4;
    pub const COMMENT: usize = 6;
    pub const COUNT: usize = 7;
}

/// Handler for the `share` resource type.
#[derive(Debug, Clone)]
pub struct ShareResource {
    schema: ResourceSchema,
}

impl ShareResource {
    pub fn new() -> Self {
        Self {
            schema: ResourceSchema::share(),
        }
    }

    fn execute(
        warehouse: &dyn Warehouse,
        statement: &Statement,
        action: impl FnOnce() -> String,
    ) -> ShareResult<()> {
        debug!(sql = %statement, "executing statement");
        warehouse
            .execute(statement)
            .map_err(|e| ShareError::execution(action(), e))
    }

    /// Bring the remote account list in line with the declared one.
    ///
    /// A non-empty set replaces the list wholesale. An empty set revokes
    /// whatever was previously granted.
    fn apply_accounts(
        &self,
        builder: &ShareBuilder,
        name: &str,
        accounts: &BTreeSet<String>,
        previous: Option<&BTreeSet<String>>,
        warehouse: &dyn Warehouse,
    ) -> ShareResult<()> {
        if !accounts.is_empty() {
            let stmt = builder.set_accounts(accounts)?;
            return Self::execute(warehouse, &stmt, || {
                format!("error adding accounts to share {}", name)
            });
        }

        match previous {
            Some(previous) if !previous.is_empty() => {
                let stmt = builder.remove_accounts(previous)?;
                Self::execute(warehouse, &stmt, || {
                    format!("error removing accounts from share {}", name)
                })
            }
            _ => Ok(()),
        }
    }

    /// Generic updater for the schema's updatable properties.
    fn update_properties(
        &self,
        builder: &ShareBuilder,
        data: &ResourceData,
        warehouse: &dyn Warehouse,
    ) -> ShareResult<()> {
        for property in &self.schema.updatable_properties {
            if !data.has_change(property.attribute()) {
                continue;
            }
            let value = data.config.property(*property);
            let stmt = if value.is_empty() {
                builder.unset_property(*property)
            } else {
                builder.set_property(*property, value)
            };
            Self::execute(warehouse, &stmt, || {
                format!("error updating share {}", property.attribute())
            })?;
        }
        Ok(())
    }
}

impl Default for ShareResource {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a `SHOW SHARES` row describes the share `id`.
///
/// The pattern is matched case-insensitively by the warehouse, so rows for
/// differently cased names can come back too.
fn row_names(row: &Row, id: &str) -> bool {
    strip_account_from_name(row.string(column::NAME)) == id
}

/// Decode one `SHOW SHARES` row into observed state.
fn decode_row(id: &str, row: &Row) -> ShareResult<ShareState> {
    if row.len() != column::COUNT {
        return Err(ShareError::decode(
            id,
            format!("expected {} columns, got {}", column::COUNT, row.len()),
        ));
    }

    Ok(ShareState {
        name: strip_account_from_name(row.string(column::NAME)).to_string(),
        comment: row.string(column::COMMENT).to_string(),
        accounts: split_grantee_list(row.string(column::TO)),
    })
}

impl Resource for ShareResource {
    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn create(&self, data: &mut ResourceData, warehouse: &dyn Warehouse) -> ShareResult<()> {
        data.config.validate()?;
        let name = data.config.name.clone();
        info!(share = %name, accounts = data.config.accounts.len(), "Creating share");

        let builder = ShareBuilder::new(&name);
        let create = builder.create(data.config.comment.as_deref());
        // Render accounts up front so a bad identifier fails before anything is created
        let set_accounts = if data.config.accounts.is_empty() {
            None
        } else {
            Some(builder.set_accounts(&data.config.accounts)?)
        };

        Self::execute(warehouse, &create, || "error creating share".to_string())?;

        if let Some(stmt) = set_accounts {
            if let Err(e) = Self::execute(warehouse, &stmt, || {
                format!("error adding accounts to share {}", name)
            }) {
                warn!(share = %name, "Share created but accounts were not set");
                return Err(e);
            }
        }

        data.set_id(name);
        self.read(data, warehouse)
    }

    fn read(&self, data: &mut ResourceData, warehouse: &dyn Warehouse) -> ShareResult<()> {
        let id = data.require_id()?.to_string();
        debug!(share = %id, "Reading share");

        let show = ShareBuilder::new(&id).show();
        let rows = warehouse
            .query(&show)
            .map_err(|e| ShareError::execution(format!("error reading share {}", id), e))?;

        let row = rows
            .iter()
            .find(|row| row_names(row, &id))
            .ok_or_else(|| ShareError::not_found(&id))?;
        data.set_state(decode_row(&id, row)?);
        Ok(())
    }

    fn update(&self, data: &mut ResourceData, warehouse: &dyn Warehouse) -> ShareResult<()> {
        let id = data.require_id()?.to_string();
        data.config.validate()?;
        if let Some(attribute) = self
            .schema
            .force_new_attributes()
            .find(|a| data.has_change(a))
        {
            return Err(ShareError::immutable(attribute));
        }
        info!(share = %id, "Updating share");

        let builder = ShareBuilder::new(&id);
        if data.has_change("accounts") {
            let previous = data.state().map(|s| &s.accounts);
            self.apply_accounts(&builder, &id, &data.config.accounts, previous, warehouse)?;
        }
        self.update_properties(&builder, data, warehouse)?;

        self.read(data, warehouse)
    }

    fn delete(&self, data: &mut ResourceData, warehouse: &dyn Warehouse) -> ShareResult<()> {
        let id = data.require_id()?.to_string();
        info!(share = %id, "Dropping share");

        let drop = ShareBuilder::new(&id).drop();
        Self::execute(warehouse, &drop, || "error dropping share".to_string())?;
        data.clear();
        Ok(())
    }

    fn exists(&self, data: &ResourceData, warehouse: &dyn Warehouse) -> ShareResult<bool> {
        let id = data.require_id()?;
        let rows = warehouse
            .query(&ShareBuilder::new(id).show())
            .map_err(|e| ShareError::execution("error checking share existence", e))?;
        Ok(rows.iter().any(|row| row_names(row, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ShareConfig;
    use crate::warehouse::mock::{MockConfig, MockWarehouse};
    use crate::warehouse::WarehouseError;

    fn show_row(name: &str, to: &str, comment: &str) -> Row {
        Row::from_strings([
            "2026-10-16T00:00:00Z",
            "OUTBOUND",
            name,
            "",
            to,
            "ACCOUNTADMIN",
            comment,
        ])
    }

    fn state(name: &str, comment: &str, accounts: &[&str]) -> ShareState {
        ShareState {
            name: name.to_string(),
            comment: comment.to_string(),
            accounts: accounts.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_decode_row() {
        let state = decode_row("s", &show_row("yt12345.s", "acc1, acc2, acc3", "hi")).unwrap();
        assert_eq!(state.name, "s");
        assert_eq!(state.comment, "hi");
        assert_eq!(state.accounts.len(), 3);
        assert!(state.accounts.contains("acc2"));
    }

    #[test]
    fn test_decode_row_nulls_and_empty_grantees() {
        let row = Row::new(vec![None, None, Some("s".to_string()), None, None, None, None]);
        let state = decode_row("s", &row).unwrap();
        assert_eq!(state.name, "s");
        assert_eq!(state.comment, "");
        assert!(state.accounts.is_empty());
    }

    #[test]
    fn test_decode_row_wrong_column_count() {
        let err = decode_row("s", &Row::from_strings(["a", "b", "c"])).unwrap_err();
        assert!(matches!(err, ShareError::Decode { .. }));
        assert!(err.to_string().contains("expected 7 columns, got 3"));
    }

    #[test]
    fn test_create_issues_create_then_accounts_then_show() {
        let wh = MockWarehouse::with_config(MockConfig::with_rows(vec![show_row(
            "yt12345.s",
            "A, B",
            "c",
        )]));
        let mut data = ResourceData::new(
            ShareConfig::new("s")
                .with_comment("c")
                .with_accounts(["B", "A"]),
        );

        ShareResource::new().create(&mut data, &wh).unwrap();

        assert_eq!(
            wh.executed_sql(),
            vec![
                "CREATE SHARE \"s\" COMMENT = ?",
                "ALTER SHARE \"s\" SET ACCOUNTS=A,B",
                "SHOW SHARES LIKE ?",
            ]
        );
        assert_eq!(data.id(), Some("s"));
        assert_eq!(data.state(), Some(&state("s", "c", &["A", "B"])));
    }

    #[test]
    fn test_create_without_accounts_skips_alter() {
        let wh = MockWarehouse::with_config(MockConfig::with_rows(vec![show_row("x.s", "", "")]));
        let mut data = ResourceData::new(ShareConfig::new("s"));

        ShareResource::new().create(&mut data, &wh).unwrap();

        assert_eq!(
            wh.executed_sql(),
            vec!["CREATE SHARE \"s\"", "SHOW SHARES LIKE ?"]
        );
        assert!(data.state().unwrap().accounts.is_empty());
    }

    #[test]
    fn test_create_rejects_empty_name_without_statements() {
        let wh = MockWarehouse::new();
        let mut data = ResourceData::new(ShareConfig::new(""));
        let err = ShareResource::new().create(&mut data, &wh).unwrap_err();
        assert!(matches!(err, ShareError::InvalidConfig { .. }));
        assert!(wh.statements().is_empty());
    }

    #[test]
    fn test_create_failure_is_annotated() {
        let wh = MockWarehouse::with_config(MockConfig::default().failing_on("create"));
        let mut data = ResourceData::new(ShareConfig::new("s"));
        let err = ShareResource::new().create(&mut data, &wh).unwrap_err();
        assert!(err.to_string().starts_with("error creating share"));
        assert!(data.id().is_none());
    }

    #[test]
    fn test_create_accounts_failure_leaves_id_unset() {
        let wh = MockWarehouse::with_config(MockConfig::default().failing_on("set_accounts"));
        let mut data = ResourceData::new(ShareConfig::new("s").with_accounts(["A"]));

        let err = ShareResource::new().create(&mut data, &wh).unwrap_err();

        assert!(err
            .to_string()
            .starts_with("error adding accounts to share s"));
        assert!(data.id().is_none());
        assert_eq!(wh.statements().len(), 2);
    }

    #[test]
    fn test_read_absent_is_not_found() {
        let wh = MockWarehouse::new();
        let mut data = ResourceData::imported("gone");
        let err = ShareResource::new().read(&mut data, &wh).unwrap_err();
        assert!(err.is_not_found());
        assert!(data.state().is_none());
    }

    #[test]
    fn test_read_connection_failure() {
        let wh = MockWarehouse::with_config(MockConfig::unavailable());
        let mut data = ResourceData::imported("s");
        let err = ShareResource::new().read(&mut data, &wh).unwrap_err();
        assert!(matches!(
            err,
            ShareError::Execution {
                source: WarehouseError::Unavailable(_),
                ..
            }
        ));
    }

    #[test]
    fn test_update_accounts_is_full_replacement() {
        let wh = MockWarehouse::with_config(MockConfig::with_rows(vec![show_row(
            "x.s", "B, C", "",
        )]));
        let mut data = ResourceData::imported("s");
        data.set_state(state("s", "", &["A", "B"]));
        data.config = ShareConfig::new("s").with_accounts(["B", "C"]);

        ShareResource::new().update(&mut data, &wh).unwrap();

        let sql = wh.executed_sql();
        let alters: Vec<_> = sql.iter().filter(|s| s.starts_with("ALTER")).collect();
        assert_eq!(alters, vec!["ALTER SHARE \"s\" SET ACCOUNTS=B,C"]);
        assert_eq!(data.state().unwrap().accounts, data.config.accounts);
    }

    #[test]
    fn test_update_clearing_accounts_removes_previous() {
        let wh = MockWarehouse::with_config(MockConfig::with_rows(vec![show_row("x.s", "", "")]));
        let mut data = ResourceData::imported("s");
        data.set_state(state("s", "", &["A", "B"]));

        ShareResource::new().update(&mut data, &wh).unwrap();

        assert_eq!(
            wh.executed_sql(),
            vec![
                "ALTER SHARE \"s\" REMOVE ACCOUNTS=A,B",
                "SHOW SHARES LIKE ?"
            ]
        );
    }

    #[test]
    fn test_update_comment_only() {
        let wh = MockWarehouse::with_config(MockConfig::with_rows(vec![show_row(
            "x.s", "A", "new",
        )]));
        let mut data = ResourceData::imported("s");
        data.set_state(state("s", "old", &["A"]));
        data.config = ShareConfig::new("s").with_comment("new").with_accounts(["A"]);

        ShareResource::new().update(&mut data, &wh).unwrap();

        assert_eq!(
            wh.executed_sql(),
            vec!["ALTER SHARE \"s\" SET COMMENT = ?", "SHOW SHARES LIKE ?"]
        );
        assert_eq!(wh.statements()[0].binds(), &["new".to_string()]);
    }

    #[test]
    fn test_update_clearing_comment_unsets() {
        let wh = MockWarehouse::with_config(MockConfig::with_rows(vec![show_row("x.s", "", "")]));
        let mut data = ResourceData::imported("s");
        data.set_state(state("s", "old", &[]));

        ShareResource::new().update(&mut data, &wh).unwrap();

        assert_eq!(wh.executed_sql()[0], "ALTER SHARE \"s\" UNSET COMMENT");
    }

    #[test]
    fn test_update_rename_rejected() {
        let wh = MockWarehouse::new();
        let mut data = ResourceData::imported("s");
        data.config = ShareConfig::new("renamed");

        let err = ShareResource::new().update(&mut data, &wh).unwrap_err();

        assert!(matches!(err, ShareError::ImmutableAttribute { ref attribute } if attribute == "name"));
        assert!(wh.statements().is_empty());
    }

    #[test]
    fn test_update_property_failure_is_annotated() {
        let wh = MockWarehouse::with_config(MockConfig::default().failing_on("set_property"));
        let mut data = ResourceData::imported("s");
        data.set_state(state("s", "", &[]));
        data.config = ShareConfig::new("s").with_comment("c");

        let err = ShareResource::new().update(&mut data, &wh).unwrap_err();
        assert!(err.to_string().starts_with("error updating share comment"));
    }

    #[test]
    fn test_delete_clears_data() {
        let wh = MockWarehouse::new();
        let mut data = ResourceData::imported("s");
        ShareResource::new().delete(&mut data, &wh).unwrap();
        assert_eq!(wh.executed_sql(), vec!["DROP SHARE \"s\""]);
        assert!(data.id().is_none());
    }

    #[test]
    fn test_delete_failure_keeps_id() {
        let wh = MockWarehouse::with_config(MockConfig::default().failing_on("drop"));
        let mut data = ResourceData::imported("s");
        let err = ShareResource::new().delete(&mut data, &wh).unwrap_err();
        assert!(err.to_string().starts_with("error dropping share"));
        assert_eq!(data.id(), Some("s"));
    }

    #[test]
    fn test_exists() {
        let resource = ShareResource::new();
        let data = ResourceData::imported("s");

        let wh = MockWarehouse::new();
        assert!(!resource.exists(&data, &wh).unwrap());

        wh.set_rows(vec![show_row("x.s", "", "")]);
        assert!(resource.exists(&data, &wh).unwrap());
    }

    #[test]
    fn test_exists_ignores_rows_for_other_names() {
        let wh = MockWarehouse::with_config(MockConfig::with_rows(vec![
            show_row("x.sx", "", ""),
            show_row("x.S", "", ""),
        ]));
        let data = ResourceData::imported("s");
        assert!(!ShareResource::new().exists(&data, &wh).unwrap());
    }

    #[test]
    fn test_read_picks_row_with_exact_name() {
        let wh = MockWarehouse::with_config(MockConfig::with_rows(vec![
            show_row("x.myxshare", "", "other"),
            show_row("x.my_share", "A", "mine"),
        ]));
        let mut data = ResourceData::imported("my_share");
        ShareResource::new().read(&mut data, &wh).unwrap();
        assert_eq!(data.state(), Some(&state("my_share", "mine", &["A"])));
    }

    #[test]
    fn test_read_only_other_names_is_not_found() {
        let wh = MockWarehouse::with_config(MockConfig::with_rows(vec![show_row(
            "x.myxshare",
            "",
            "",
        )]));
        let mut data = ResourceData::imported("my_share");
        let err = ShareResource::new().read(&mut data, &wh).unwrap_err();
        assert!(err.is_not_found());
        assert!(data.state().is_none());
    }

    #[test]
    fn test_exists_propagates_connection_errors() {
        let wh = MockWarehouse::with_config(MockConfig::unavailable());
        let err = ShareResource::new()
            .exists(&ResourceData::imported("s"), &wh)
            .unwrap_err();
        assert!(matches!(err, ShareError::Execution { .. }));
    }

    #[test]
    fn test_import_reads_state() {
        let wh = MockWarehouse::with_config(MockConfig::with_rows(vec![show_row(
            "acct.s", "X", "imported",
        )]));
        let data = ShareResource::new().import("s", &wh).unwrap();
        assert_eq!(data.id(), Some("s"));
        assert_eq!(data.state(), Some(&state("s", "imported", &["X"])));
    }
}
