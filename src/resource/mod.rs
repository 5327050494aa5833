//! Resource handlers invoked by the host orchestrator.
//!
//! The host owns planning and state persistence. It hands each operation a
//! `ResourceData` (declared config plus the last observed state) and a
//! warehouse connection, and persists whatever state the operation leaves
//! behind.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ShareError, ShareResult};
use crate::schema::{ResourceSchema, ShareProperty};
use crate::warehouse::Warehouse;

mod share;

pub use share::ShareResource;

/// Declared (desired) share configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(default)]
    pub accounts: BTreeSet<String>,
}

impl ShareConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_accounts<I, S>(mut self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accounts = accounts.into_iter().map(Into::into).collect();
        self
    }

    /// Presence checks that serde cannot express.
    pub fn validate(&self) -> ShareResult<()> {
        if self.name.trim().is_empty() {
            return Err(ShareError::invalid_config("name", "must not be empty"));
        }
        if let Some(account) = self.accounts.iter().find(|a| a.trim().is_empty()) {
            return Err(ShareError::invalid_identifier(
                account.as_str(),
                "account identifier is empty",
            ));
        }
        Ok(())
    }

    /// Value of a scalar property, `""` when unset.
    pub fn property(&self, property: ShareProperty) -> &str {
        match property {
            ShareProperty::Comment => self.comment.as_deref().unwrap_or(""),
        }
    }
}

/// Observed share state, as persisted by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShareState {
    pub name: String,
    pub comment: String,
    pub accounts: BTreeSet<String>,
}

impl ShareState {
    pub fn property(&self, property: ShareProperty) -> &str {
        match property {
            ShareProperty::Comment => &self.comment,
        }
    }
}

/// Mutable object passed to every operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceData {
    id: Option<String>,
    pub config: ShareConfig,
    state: Option<ShareState>,
}

impl ResourceData {
    /// Data for a resource that has not been created yet.
    pub fn new(config: ShareConfig) -> Self {
        Self {
            id: None,
            config,
            state: None,
        }
    }

    /// Data for a resource that already exists under `id`.
    ///
    /// The identifier doubles as the share name, so the config is seeded with it.
    pub fn imported(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            config: ShareConfig::new(id.clone()),
            id: Some(id),
            state: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn state(&self) -> Option<&ShareState> {
        self.state.as_ref()
    }

    pub fn set_state(&mut self, state: ShareState) {
        self.state = Some(state);
    }

    /// Forget the identifier and state after the resource is destroyed.
    pub fn clear(&mut self) {
        self.id = None;
        self.state = None;
    }

    /// Identifier, or an error for data that was never created or imported.
    pub fn require_id(&self) -> ShareResult<&str> {
        self.id()
            .ok_or_else(|| ShareError::invalid_config("id", "resource has no identifier"))
    }

    /// Whether the declared value of `attribute` differs from the observed one.
    ///
    /// The name is compared with the identifier when there is one, since the
    /// identifier is the name the share was created under. Without observed
    /// state every non-empty declared value counts as a change.
    pub fn has_change(&self, attribute: &str) -> bool {
        let config = &self.config;
        if let ("name", Some(id)) = (attribute, self.id()) {
            return config.name != id;
        }
        match (attribute, self.state.as_ref()) {
            ("name", Some(state)) => config.name != state.name,
            ("name", None) => !config.name.is_empty(),
            ("comment", Some(state)) => {
                config.property(ShareProperty::Comment) != state.property(ShareProperty::Comment)
            }
            ("comment", None) => !config.property(ShareProperty::Comment).is_empty(),
            ("accounts", Some(state)) => config.accounts != state.accounts,
            ("accounts", None) => !config.accounts.is_empty(),
            _ => false,
        }
    }
}

/// Operations a resource type exposes to the host orchestrator.
pub trait Resource {
    /// Schema registered for this resource type.
    fn schema(&self) -> &ResourceSchema;

    /// Create the resource, set its identifier and read it back.
    fn create(&self, data: &mut ResourceData, warehouse: &dyn Warehouse) -> ShareResult<()>;

    /// Refresh `data`'s state from the warehouse.
    fn read(&self, data: &mut ResourceData, warehouse: &dyn Warehouse) -> ShareResult<()>;

    /// Apply declared changes and read the result back.
    fn update(&self, data: &mut ResourceData, warehouse: &dyn Warehouse) -> ShareResult<()>;

    fn delete(&self, data: &mut ResourceData, warehouse: &dyn Warehouse) -> ShareResult<()>;

    /// Whether the resource still exists remotely. Absence is `Ok(false)`.
    fn exists(&self, data: &ResourceData, warehouse: &dyn Warehouse) -> ShareResult<bool>;

    /// Passthrough import: adopt `id` and read its state.
    fn import(&self, id: &str, warehouse: &dyn Warehouse) -> ShareResult<ResourceData> {
        let mut data = ResourceData::imported(id);
        self.read(&mut data, warehouse)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(name: &str, comment: &str, accounts: &[&str]) -> ShareState {
        ShareState {
            name: name.to_string(),
            comment: comment.to_string(),
            accounts: accounts.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        assert!(matches!(
            ShareConfig::new("  ").validate(),
            Err(ShareError::InvalidConfig { .. })
        ));
        assert!(ShareConfig::new("ok").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_account() {
        let config = ShareConfig::new("s").with_accounts(["a", " "]);
        assert!(matches!(
            config.validate(),
            Err(ShareError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: ShareConfig = toml::from_str(r#"name = "s""#).unwrap();
        assert_eq!(config.name, "s");
        assert!(config.comment.is_none());
        assert!(config.accounts.is_empty());
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let result: Result<ShareConfig, _> = toml::from_str(
            r#"
            name = "s"
            owner = "me"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_config_rejects_wrong_types() {
        let result: Result<ShareConfig, _> = toml::from_str(
            r#"
            name = "s"
            accounts = "a,b"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_imported_seeds_name() {
        let data = ResourceData::imported("my_share");
        assert_eq!(data.id(), Some("my_share"));
        assert_eq!(data.config.name, "my_share");
        assert!(data.state().is_none());
    }

    #[test]
    fn test_require_id() {
        let data = ResourceData::new(ShareConfig::new("s"));
        assert!(data.require_id().is_err());
    }

    #[test]
    fn test_has_change_against_state() {
        let mut data = ResourceData::new(
            ShareConfig::new("s")
                .with_comment("c")
                .with_accounts(["B", "C"]),
        );
        data.set_state(state("s", "c", &["A", "B"]));

        assert!(!data.has_change("name"));
        assert!(!data.has_change("comment"));
        assert!(data.has_change("accounts"));
        assert!(!data.has_change("unknown"));
    }

    #[test]
    fn test_has_change_unset_comment_matches_empty() {
        let mut data = ResourceData::new(ShareConfig::new("s"));
        data.set_state(state("s", "", &[]));
        assert!(!data.has_change("comment"));

        data.set_state(state("s", "old", &[]));
        assert!(data.has_change("comment"));
    }

    #[test]
    fn test_has_change_without_state() {
        let data = ResourceData::new(ShareConfig::new("s").with_accounts(["A"]));
        assert!(data.has_change("name"));
        assert!(data.has_change("accounts"));
        assert!(!data.has_change("comment"));
    }

    #[test]
    fn test_has_change_name_against_id() {
        let mut data = ResourceData::imported("s");
        assert!(!data.has_change("name"));

        data.config = ShareConfig::new("renamed");
        assert!(data.has_change("name"));

        // The identifier wins over a differently cased observed name
        data.config = ShareConfig::new("s");
        data.set_state(state("S", "", &[]));
        assert!(!data.has_change("name"));
    }

    #[test]
    fn test_clear() {
        let mut data = ResourceData::imported("s");
        data.set_state(state("s", "", &[]));
        data.clear();
        assert!(data.id().is_none());
        assert!(data.state().is_none());
    }

    #[test]
    fn test_state_serializes_accounts_as_list() {
        let json = serde_json::to_value(state("s", "c", &["b", "a"])).unwrap();
        assert_eq!(json["accounts"], serde_json::json!(["a", "b"]));
    }
}
