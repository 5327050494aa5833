//! Share statement construction.
//!
//! Statements keep their typed form next to the rendered SQL so that a driver
//! can send `sql()` with `binds()` while the emulated warehouse dispatches on
//! `kind()` without parsing SQL.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::ShareResult;
use crate::identifier::{escape_like_pattern, quote_identifier, render_account_list};
use crate::schema::ShareProperty;

/// Typed form of a share statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Create {
        name: String,
        comment: Option<String>,
    },
    SetAccounts {
        name: String,
        accounts: BTreeSet<String>,
    },
    RemoveAccounts {
        name: String,
        accounts: BTreeSet<String>,
    },
    SetProperty {
        name: String,
        property: ShareProperty,
        value: String,
    },
    UnsetProperty {
        name: String,
        property: ShareProperty,
    },
    Show {
        pattern: String,
    },
    Drop {
        name: String,
    },
}

impl StatementKind {
    /// Short label for logs and fault injection.
    pub fn label(&self) -> &'static str {
        match self {
            StatementKind::Create { .. } => "create",
            StatementKind::SetAccounts { .. } => "set_accounts",
            StatementKind::RemoveAccounts { .. } => "remove_accounts",
            StatementKind::SetProperty { .. } => "set_property",
            StatementKind::UnsetProperty { .. } => "unset_property",
            StatementKind::Show { .. } => "show",
            StatementKind::Drop { .. } => "drop",
        }
    }
}

/// A rendered statement with its bind values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    kind: StatementKind,
    sql: String,
    binds: Vec<String>,
}

impl Statement {
    pub fn kind(&self) -> &StatementKind {
        &self.kind
    }

    /// SQL text, with `?` placeholders for each bind value.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[String] {
        &self.binds
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Builds statements for a single share.
#[derive(Debug, Clone)]
pub struct ShareBuilder {
    name: String,
}

impl ShareBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn quoted_name(&self) -> String {
        quote_identifier(&self.name)
    }

    /// `CREATE SHARE`, with the comment bound when present.
    pub fn create(&self, comment: Option<&str>) -> Statement {
        let comment = comment.filter(|c| !c.is_empty()).map(str::to_string);
        let mut sql = format!("CREATE SHARE {}", self.quoted_name());
        let mut binds = Vec::new();
        if let Some(ref c) = comment {
            sql.push_str(&format!(" {} = ?", ShareProperty::Comment.keyword()));
            binds.push(c.clone());
        }
        Statement {
            kind: StatementKind::Create {
                name: self.name.clone(),
                comment,
            },
            sql,
            binds,
        }
    }

    /// Replace the full account list.
    pub fn set_accounts(&self, accounts: &BTreeSet<String>) -> ShareResult<Statement> {
        let list = render_account_list(accounts)?;
        Ok(Statement {
            kind: StatementKind::SetAccounts {
                name: self.name.clone(),
                accounts: accounts.clone(),
            },
            sql: format!("ALTER SHARE {} SET ACCOUNTS={}", self.quoted_name(), list),
            binds: Vec::new(),
        })
    }

    /// Revoke the given accounts.
    pub fn remove_accounts(&self, accounts: &BTreeSet<String>) -> ShareResult<Statement> {
        let list = render_account_list(accounts)?;
        Ok(Statement {
            kind: StatementKind::RemoveAccounts {
                name: self.name.clone(),
                accounts: accounts.clone(),
            },
            sql: format!("ALTER SHARE {} REMOVE ACCOUNTS={}", self.quoted_name(), list),
            binds: Vec::new(),
        })
    }

    pub fn set_property(&self, property: ShareProperty, value: &str) -> Statement {
        Statement {
            kind: StatementKind::SetProperty {
                name: self.name.clone(),
                property,
                value: value.to_string(),
            },
            sql: format!(
                "ALTER SHARE {} SET {} = ?",
                self.quoted_name(),
                property.keyword()
            ),
            binds: vec![value.to_string()],
        }
    }

    pub fn unset_property(&self, property: ShareProperty) -> Statement {
        Statement {
            kind: StatementKind::UnsetProperty {
                name: self.name.clone(),
                property,
            },
            sql: format!(
                "ALTER SHARE {} UNSET {}",
                self.quoted_name(),
                property.keyword()
            ),
            binds: Vec::new(),
        }
    }

    /// `SHOW SHARES LIKE ?`, bound to the share name with wildcards escaped.
    pub fn show(&self) -> Statement {
        let pattern = escape_like_pattern(&self.name);
        Statement {
            kind: StatementKind::Show {
                pattern: pattern.clone(),
            },
            sql: "SHOW SHARES LIKE ?".to_string(),
            binds: vec![pattern],
        }
    }

    pub fn drop(&self) -> Statement {
        Statement {
            kind: StatementKind::Drop {
                name: self.name.clone(),
            },
            sql: format!("DROP SHARE {}", self.quoted_name()),
            binds: Vec::new(),
        }
    }
}
