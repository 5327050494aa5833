//! Resource schema for shares.
//!
//! Describes the attributes a host persists for a share and which scalar
//! properties the generic updater may change. Built once when the resource
//! type is registered.

use serde::Serialize;

/// Value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    StringSet,
}

/// One attribute in the resource schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub required: bool,
    /// Changing the value requires destroying and recreating the resource.
    pub force_new: bool,
    pub description: &'static str,
}

/// Scalar share properties that can be changed with `ALTER SHARE ... SET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareProperty {
    Comment,
}

impl ShareProperty {
    /// Keyword used in statements.
    pub fn keyword(&self) -> &'static str {
        match self {
            ShareProperty::Comment => "COMMENT",
        }
    }

    /// Attribute name in the schema.
    pub fn attribute(&self) -> &'static str {
        match self {
            ShareProperty::Comment => "comment",
        }
    }
}

/// Schema for a resource type.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub attributes: Vec<Attribute>,
    /// Properties handled by the generic updater. Anything else that
    /// changes needs a dedicated path.
    pub updatable_properties: Vec<ShareProperty>,
}

impl ResourceSchema {
    /// Schema of the `share` resource.
    pub fn share() -> Self {
        Self {
            type_name: "share",
            attributes: vec![
                Attribute {
                    name: "name",
                    kind: AttributeKind::String,
                    required: true,
                    force_new: true,
                    description: "Specifies the identifier for the share; must be unique for the account in which the share is created.",
                },
                Attribute {
                    name: "comment",
                    kind: AttributeKind::String,
                    required: false,
                    force_new: false,
                    description: "Specifies a comment for the share.",
                },
                Attribute {
                    name: "accounts",
                    kind: AttributeKind::StringSet,
                    required: false,
                    force_new: false,
                    description: "A list of accounts to be added to the share.",
                },
            ],
            updatable_properties: vec![ShareProperty::Comment],
        }
    }

    /// Names of attributes whose change forces replacement.
    pub fn force_new_attributes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes
            .iter()
            .filter(|a| a.force_new)
            .map(|a| a.name)
    }
}
